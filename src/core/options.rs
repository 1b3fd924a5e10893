//! # Per-call start options.
//!
//! [`StartOptions`] overrides [`ContainerConfig`] for one `start()` call. Every
//! field is optional; [`StartPlan::resolve`] merges the two and validates the
//! result before anything reaches the host.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ContainerConfig;
use crate::error::ContainerError;
use crate::host::LaunchSpec;
use crate::policies::{PollPolicy, RetryPolicy};

/// Options for a single `start()` call.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use containervisor::{RetryPolicy, StartOptions};
///
/// let opts = StartOptions::default()
///     .with_port(8080)
///     .with_retries(RetryPolicy::new(3, Duration::from_secs(2)))
///     .with_cancel(CancellationToken::new())
///     .wait_for_ready(false);
/// assert_eq!(opts.port, Some(8080));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StartOptions {
    /// Environment variables (replaces the configured set).
    pub env_vars: Option<BTreeMap<String, String>>,
    /// Entrypoint override.
    pub entrypoint: Option<Vec<String>>,
    /// Internet access (default `true`).
    pub enable_internet: Option<bool>,
    /// Caller cancellation; cancels the whole start loop.
    pub cancel: Option<CancellationToken>,
    /// Wait for the application to accept connections (default `true`).
    pub wait_for_ready: Option<bool>,
    /// Attempt limit and per-probe timeout.
    pub retries: Option<RetryPolicy>,
    /// Port to probe.
    pub port: Option<u16>,
}

impl StartOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_retries(mut self, retries: RetryPolicy) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_vars = Some(env);
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: Vec<String>) -> Self {
        self.entrypoint = Some(entrypoint);
        self
    }

    pub fn with_internet(mut self, enabled: bool) -> Self {
        self.enable_internet = Some(enabled);
        self
    }

    pub fn wait_for_ready(mut self, wait: bool) -> Self {
        self.wait_for_ready = Some(wait);
        self
    }
}

/// Fully resolved parameters of one startup run.
#[derive(Clone, Debug)]
pub(crate) struct StartPlan {
    pub launch: LaunchSpec,
    pub cancel: CancellationToken,
    pub wait_for_ready: bool,
    pub retries: RetryPolicy,
    pub poll: PollPolicy,
    pub port: u16,
    pub inactivity: Duration,
}

impl StartPlan {
    /// Merges `opts` over `cfg`; port resolves as explicit → configured → fallback.
    ///
    /// Fails on a bad environment variable or port 0.
    pub fn resolve(
        opts: StartOptions,
        cfg: &ContainerConfig,
        inactivity: Duration,
    ) -> Result<Self, ContainerError> {
        let env = opts.env_vars.unwrap_or_else(|| cfg.env_vars.clone());
        validate_env(&env)?;
        let entrypoint = opts.entrypoint.unwrap_or_else(|| cfg.entrypoint.clone());
        let port = opts.port.unwrap_or_else(|| cfg.probe_port());
        if port == 0 {
            return Err(ContainerError::InvalidPort { port });
        }

        Ok(Self {
            launch: LaunchSpec {
                entrypoint: (!entrypoint.is_empty()).then_some(entrypoint),
                enable_internet: opts.enable_internet.unwrap_or(cfg.enable_internet),
                env: (!env.is_empty()).then_some(env),
                hard_timeout: cfg.hard_timeout,
            },
            cancel: opts.cancel.unwrap_or_default(),
            wait_for_ready: opts.wait_for_ready.unwrap_or(true),
            retries: opts.retries.unwrap_or(cfg.retries),
            poll: cfg.poll,
            port,
            inactivity,
        })
    }
}

/// Names may not contain `=` or NUL; values may not contain NUL.
fn validate_env(env: &BTreeMap<String, String>) -> Result<(), ContainerError> {
    for (name, value) in env {
        let reason = if name.is_empty() {
            "name is empty"
        } else if name.contains('=') {
            "name contains '='"
        } else if name.contains('\0') {
            "name contains NUL"
        } else if value.contains('\0') {
            "value contains NUL"
        } else {
            continue;
        };
        return Err(ContainerError::InvalidEnv {
            name: name.clone(),
            reason,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FALLBACK_PORT;

    fn resolve(opts: StartOptions, cfg: &ContainerConfig) -> Result<StartPlan, ContainerError> {
        StartPlan::resolve(opts, cfg, Duration::from_secs(600))
    }

    #[test]
    fn test_defaults_come_from_config() {
        let mut cfg = ContainerConfig::default();
        cfg.env_vars.insert("MODE".into(), "prod".into());
        cfg.entrypoint = vec!["/bin/server".into()];

        let plan = resolve(StartOptions::default(), &cfg).unwrap();
        assert!(plan.wait_for_ready);
        assert!(plan.launch.enable_internet);
        assert_eq!(plan.port, FALLBACK_PORT);
        assert_eq!(plan.retries.limit, 10);
        assert_eq!(plan.launch.entrypoint.as_deref(), Some(&["/bin/server".to_string()][..]));
        assert_eq!(plan.launch.env.unwrap()["MODE"], "prod");
        assert!(!plan.cancel.is_cancelled());
    }

    #[test]
    fn test_port_precedence() {
        let mut cfg = ContainerConfig::default();
        cfg.default_port = Some(8080);
        assert_eq!(resolve(StartOptions::default(), &cfg).unwrap().port, 8080);
        assert_eq!(
            resolve(StartOptions::default().with_port(9000), &cfg)
                .unwrap()
                .port,
            9000
        );
    }

    #[test]
    fn test_empty_collections_are_not_sent() {
        let plan = resolve(StartOptions::default(), &ContainerConfig::default()).unwrap();
        assert!(plan.launch.env.is_none());
        assert!(plan.launch.entrypoint.is_none());
    }

    #[test]
    fn test_invalid_env_is_rejected() {
        for (name, value) in [("A=B", "x"), ("A\0", "x"), ("A", "x\0y"), ("", "x")] {
            let env = BTreeMap::from([(name.to_string(), value.to_string())]);
            let err = resolve(
                StartOptions::default().with_env(env),
                &ContainerConfig::default(),
            )
            .unwrap_err();
            assert_eq!(err.as_label(), "invalid_env", "name {name:?}");
        }
    }

    #[test]
    fn test_port_zero_is_rejected() {
        let err = resolve(StartOptions::default().with_port(0), &ContainerConfig::default())
            .unwrap_err();
        assert!(matches!(err, ContainerError::InvalidPort { port: 0 }));

        let mut cfg = ContainerConfig::default();
        cfg.default_port = Some(0);
        let err = resolve(StartOptions::default(), &cfg).unwrap_err();
        assert_eq!(err.as_label(), "invalid_port");
    }
}
