//! # Request routing into the container.
//!
//! ```text
//! handle(request)
//!   ├─► port = config.default_port ?: destination port ?: MissingPort
//!   │          (URI authority, or the Host header for origin-form URIs)
//!   ├─► start(wait_for_ready, port, request's CancellationToken)
//!   ├─► rewrite scheme to plain http
//!   └─► handle.fetch(port, request)
//! ```
//!
//! The request's cancellation token travels in its extensions; without one
//! the request is never cancelled. Startup failures are returned as-is: all
//! retrying happens inside the start loop.

use bytes::Bytes;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{Request, Response, Uri, header};
use tokio_util::sync::CancellationToken;

use super::container::Container;
use super::options::StartOptions;
use crate::error::ContainerError;

impl Container {
    /// Starts the container if needed and forwards `request` to it.
    ///
    /// # Example
    /// ```no_run
    /// # async fn demo(container: &containervisor::Container) -> Result<(), containervisor::ContainerError> {
    /// use bytes::Bytes;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let mut request = http::Request::new(Bytes::new());
    /// *request.uri_mut() = "https://app.internal:8080/health".parse().unwrap();
    /// request.extensions_mut().insert(CancellationToken::new());
    ///
    /// let response = container.handle(request).await?;
    /// println!("{}", response.status());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn handle(&self, mut request: Request<Bytes>) -> Result<Response<Bytes>, ContainerError> {
        let port = self
            .config()
            .default_port
            .or_else(|| destination_port(&request))
            .ok_or(ContainerError::MissingPort)?;
        let cancel = request
            .extensions()
            .get::<CancellationToken>()
            .cloned()
            .unwrap_or_default();

        self.start(
            StartOptions::default()
                .with_port(port)
                .with_cancel(cancel.clone())
                .wait_for_ready(true),
        )
        .await?;

        let uri = std::mem::take(request.uri_mut());
        *request.uri_mut() = plain_http(uri);
        self.handle_ref().fetch(port, request, cancel).await
    }
}

/// Port the request is addressed to.
fn destination_port(request: &Request<Bytes>) -> Option<u16> {
    if request.uri().authority().is_some() {
        return request.uri().port_u16();
    }
    request
        .headers()
        .get(header::HOST)?
        .to_str()
        .ok()?
        .parse::<Authority>()
        .ok()?
        .port_u16()
}

/// Rewrites an absolute URI to the `http` scheme; relative URIs pass through.
fn plain_http(uri: Uri) -> Uri {
    if uri.authority().is_none() || uri.scheme() == Some(&Scheme::HTTP) {
        return uri;
    }
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Uri::from_parts(parts).unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str, host: Option<&str>) -> Request<Bytes> {
        let mut builder = Request::get(uri);
        if let Some(host) = host {
            builder = builder.header(header::HOST, host);
        }
        builder.body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_destination_port_sources() {
        assert_eq!(destination_port(&get("https://app:8443/a", None)), Some(8443));
        assert_eq!(destination_port(&get("/health", Some("app.internal:8080"))), Some(8080));
        assert_eq!(destination_port(&get("/health", Some("app.internal"))), None);
        assert_eq!(destination_port(&get("/health", None)), None);
        // An absolute URI wins over the Host header.
        assert_eq!(destination_port(&get("http://app/x", Some("app:9000"))), None);
    }

    #[test]
    fn test_plain_http_rewrites_tls_scheme() {
        let uri: Uri = "https://example.com:8443/a?b=c".parse().unwrap();
        assert_eq!(plain_http(uri).to_string(), "http://example.com:8443/a?b=c");
    }

    #[test]
    fn test_plain_http_keeps_relative_and_http() {
        let rel: Uri = "/only/path".parse().unwrap();
        assert_eq!(plain_http(rel).to_string(), "/only/path");

        let http: Uri = "http://example.com/x".parse().unwrap();
        assert_eq!(plain_http(http).to_string(), "http://example.com/x");
    }
}
