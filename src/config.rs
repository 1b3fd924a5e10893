//! # Static container configuration.
//!
//! [`ContainerConfig`] holds the defaults every `start()` falls back to when
//! its [`StartOptions`](crate::StartOptions) leave a field unset.
//!
//! ## Sentinel values
//! - `default_port = None` → probes use [`FALLBACK_PORT`] and the router reads
//!   the port from the request
//! - `env_vars` empty / `entrypoint` empty → not sent to the host
//! - `hard_timeout = None` → no host-enforced limit
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use containervisor::{ContainerConfig, RetryPolicy};
//!
//! let mut cfg = ContainerConfig::default();
//! cfg.default_port = Some(8080);
//! cfg.sleep_after = "30s".into();
//! cfg.retries = RetryPolicy::new(3, Duration::from_secs(1));
//!
//! assert_eq!(cfg.probe_port(), 8080);
//! assert_eq!(cfg.inactivity_timeout().unwrap(), Duration::from_secs(30));
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use crate::duration::SleepAfter;
use crate::error::ContainerError;
use crate::policies::{PollPolicy, RetryPolicy};

/// Port probed when neither the call nor the configuration names one.
pub const FALLBACK_PORT: u16 = 33;

/// Defaults for one supervised container.
#[derive(Clone, Debug)]
pub struct ContainerConfig {
    /// Port the container's application listens on.
    pub default_port: Option<u16>,

    /// Inactivity period after which the host may stop the container.
    pub sleep_after: SleepAfter,

    /// Environment variables passed on start.
    pub env_vars: BTreeMap<String, String>,

    /// Entrypoint override passed on start.
    pub entrypoint: Vec<String>,

    /// Whether the container may reach the internet.
    pub enable_internet: bool,

    /// Attempt limit and per-probe timeout.
    pub retries: RetryPolicy,

    /// Pause between attempts.
    pub poll: PollPolicy,

    /// Host-enforced hard runtime limit.
    pub hard_timeout: Option<Duration>,

    /// Capacity of the event bus channel (min 1).
    pub bus_capacity: usize,
}

impl ContainerConfig {
    /// Port probed when a call does not name one.
    #[inline]
    pub fn probe_port(&self) -> u16 {
        self.default_port.unwrap_or(FALLBACK_PORT)
    }

    /// Parsed `sleep_after`; zero is rejected because the host refuses it.
    pub fn inactivity_timeout(&self) -> Result<Duration, ContainerError> {
        let timeout = self.sleep_after.to_duration()?;
        if timeout.is_zero() {
            return Err(ContainerError::InvalidTimeout);
        }
        Ok(timeout)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ContainerConfig {
    /// Default configuration:
    ///
    /// - `default_port = None`
    /// - `sleep_after = "10m"`
    /// - `enable_internet = true`
    /// - `retries = RetryPolicy::default()` (10 attempts, 5s per probe)
    /// - `poll = PollPolicy::default()` (constant 300ms)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            default_port: None,
            sleep_after: SleepAfter::default(),
            env_vars: BTreeMap::new(),
            entrypoint: Vec::new(),
            enable_internet: true,
            retries: RetryPolicy::default(),
            poll: PollPolicy::default(),
            hard_timeout: None,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_port_falls_back() {
        let mut cfg = ContainerConfig::default();
        assert_eq!(cfg.probe_port(), FALLBACK_PORT);
        cfg.default_port = Some(9000);
        assert_eq!(cfg.probe_port(), 9000);
    }

    #[test]
    fn test_zero_inactivity_is_rejected() {
        let mut cfg = ContainerConfig::default();
        cfg.sleep_after = 0u64.into();
        assert!(matches!(
            cfg.inactivity_timeout(),
            Err(ContainerError::InvalidTimeout)
        ));

        cfg.sleep_after = "bogus".into();
        assert_eq!(
            cfg.inactivity_timeout().unwrap_err().as_label(),
            "invalid_duration"
        );
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = ContainerConfig {
            bus_capacity: 0,
            ..ContainerConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
