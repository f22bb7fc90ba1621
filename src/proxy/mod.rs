//! The proxy handler: per-request fetch-or-serve orchestration.
//!
//! For every inbound request the handler derives a cache key from the
//! request target (path plus query, verbatim), serves a fresh cached body
//! when one exists, and otherwise fetches from the origin, fills the cache
//! on success, and maps failures to client responses:
//!
//! - transport failure (the call never completed) → `500` with a fixed body,
//! - completed non-2xx origin response → the origin's status code mirrored,
//!   with a fixed body,
//! - completed 2xx → cache write, then `200` with the fetched body.
//!
//! Two reference behaviors are reproduced deliberately (see DESIGN.md): the
//! cache key includes the query string but the upstream URL does not, and
//! the HTTP method is not part of the key.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cache::{CacheStore, Clock};
use crate::http::{Request, Response, StatusCode};
use crate::origin::Origin;

/// Body sent when the outbound call cannot be completed at all.
const TRANSPORT_FAILURE_BODY: &str = "Internal Server Error: Unable to fetch the resource.";

/// Body sent when the origin answers with a non-success status. The text is
/// fixed regardless of which status code is mirrored.
const ORIGIN_ERROR_BODY: &str = "404 Not Found: Check the URL or reload the page.";

/// Cache-augmented reverse-proxy handler.
///
/// Generic over the [`Origin`] (real network client in production, a
/// programmable mock in tests) and the [`Clock`] (system clock in
/// production, a manual clock in tests). One handler instance is shared
/// across all connection tasks; the internal [`CacheStore`] is the only
/// mutable state.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use rproxy::cache::SystemClock;
/// use rproxy::origin::HttpOrigin;
/// use rproxy::proxy::ProxyHandler;
///
/// let handler = ProxyHandler::new(
///     Duration::from_secs(86400),
///     HttpOrigin::new("https://voucan-us4.github.io"),
///     SystemClock,
/// );
/// ```
pub struct ProxyHandler<O, C> {
    cache: CacheStore,
    origin: O,
    clock: C,
    cache_control: String,
}

impl<O, C> ProxyHandler<O, C>
where
    O: Origin,
    C: Clock,
{
    /// Creates a handler with an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration, origin: O, clock: C) -> Self {
        Self {
            cache: CacheStore::new(ttl),
            origin,
            clock,
            cache_control: format!("max-age={}", ttl.as_secs()),
        }
    }

    /// Returns the shared cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Handles one inbound request to completion.
    ///
    /// Exactly one response is produced per call; no retries. Errors are
    /// local to this request — nothing here can disturb other in-flight
    /// requests or existing cache entries.
    pub async fn handle(&self, request: Request) -> Response {
        let key = request.target();

        // Lookup and freshness check are deliberately not atomic with the
        // write below: concurrent misses for the same key may each fetch
        // the origin, and the last write wins.
        match self.cache.lookup(&key) {
            Some(entry) if self.cache.is_fresh(Some(&entry), self.clock.now()) => {
                debug!(key = %key, "cache hit");
                Response::new(StatusCode::OK)
                    .header("Cache-Control", self.cache_control.clone())
                    .body_bytes(entry.body().to_vec())
            }
            _ => {
                debug!(key = %key, "cache miss, fetching from origin");
                self.fetch_and_fill(key, &request).await
            }
        }
    }

    /// Miss path: fetch from the origin, fill the cache on success, and
    /// translate failures.
    ///
    /// The upstream URL carries only the request path; the query string
    /// stays in the cache key but is not forwarded. The inbound body is not
    /// forwarded either, only method and headers.
    async fn fetch_and_fill(&self, key: String, request: &Request) -> Response {
        let fetched = self
            .origin
            .fetch(request.method(), request.path(), request.headers())
            .await;

        match fetched {
            Ok(upstream) if upstream.status.is_success() => {
                self.cache
                    .write(key, upstream.body.clone(), self.clock.now());
                Response::new(StatusCode::OK)
                    .header("Cache-Control", self.cache_control.clone())
                    .body_bytes(upstream.body.to_vec())
            }
            Ok(upstream) => {
                warn!(
                    key = %key,
                    status = upstream.status.as_u16(),
                    "origin returned an error status"
                );
                Response::new(upstream.status).body(ORIGIN_ERROR_BODY)
            }
            Err(err) => {
                error!(key = %key, error = %err, "origin fetch failed");
                Response::new(StatusCode::INTERNAL_SERVER_ERROR).body(TRANSPORT_FAILURE_BODY)
            }
        }
    }
}
