//! Outbound side of the proxy: fetching a resource from the upstream origin.
//!
//! [`Origin`] is the seam between the proxy handler and the network. The
//! production implementation, [`HttpOrigin`], issues a real HTTP request via
//! `reqwest`; tests substitute a programmable mock to control status codes,
//! bodies, and failures, and to count outbound calls.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::http::{Headers, Method, StatusCode};

/// Errors for outbound calls that never completed.
///
/// A completed response with an error status is *not* a `FetchError` — the
/// origin was reachable and answered, so the answer (status and all) is data
/// for the handler to mirror. This type covers only transport-level failures
/// (DNS, connection refused, timeout, body read aborted) and requests that
/// could not be constructed at all.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to origin failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request method: {0}")]
    InvalidMethod(String),
}

/// A completed origin response: the status code and the fully buffered body.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// The upstream server the proxy fetches from on a cache miss.
///
/// Implementations must be shareable across connection tasks and return
/// `Send` futures.
pub trait Origin: Send + Sync {
    /// Issues one outbound request for `path`, copying the inbound method
    /// and headers verbatim. The whole response body is buffered.
    ///
    /// # Errors
    ///
    /// [`FetchError`] when the call cannot be completed; see the type docs
    /// for what does and does not count as an error.
    fn fetch(
        &self,
        method: &Method,
        path: &str,
        headers: &Headers,
    ) -> impl Future<Output = Result<OriginResponse, FetchError>> + Send;
}

/// Production [`Origin`] backed by a shared `reqwest` client.
///
/// The upstream URL is the fixed base concatenated with the request path.
/// Redirect behavior is whatever the client does by default.
///
/// # Examples
///
/// ```rust,no_run
/// use rproxy::origin::HttpOrigin;
///
/// let origin = HttpOrigin::new("https://voucan-us4.github.io");
/// ```
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    base: String,
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Creates an origin rooted at `base` (scheme + authority, no trailing
    /// slash) with a default client.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates an origin with a caller-supplied client (custom timeouts,
    /// proxies, TLS settings).
    pub fn with_client(base: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base: base.into(),
            client,
        }
    }

    /// Returns the configured base URL.
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Origin for HttpOrigin {
    async fn fetch(
        &self,
        method: &Method,
        path: &str,
        headers: &Headers,
    ) -> Result<OriginResponse, FetchError> {
        let url = format!("{}{}", self.base, path);
        debug!(url = %url, method = %method, "fetching from origin");

        let outbound_method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|_| FetchError::InvalidMethod(method.as_str().to_owned()))?;

        let mut outbound = self.client.request(outbound_method, &url);
        for (name, value) in headers.iter() {
            outbound = outbound.header(name, value);
        }

        let response = outbound.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16());
        let body = response.bytes().await?;

        Ok(OriginResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_kept_verbatim() {
        let origin = HttpOrigin::new("http://127.0.0.1:9999");
        assert_eq!(origin.base(), "http://127.0.0.1:9999");
    }

    #[test]
    fn invalid_method_is_rejected_before_the_network() {
        let method = Method::Custom("BAD METHOD".to_owned());
        let err = reqwest::Method::from_bytes(method.as_str().as_bytes());
        assert!(err.is_err());
    }
}
