//! # rproxy
//!
//! A from-scratch async caching reverse proxy written in Rust.
//!
//! Every inbound request is forwarded to one fixed upstream origin; successful
//! response bodies are cached in memory, keyed by the request's path+query,
//! and served from cache until a TTL elapses. Origin failures map to fixed
//! error responses without touching the cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rproxy::cache::SystemClock;
//! use rproxy::config::ProxyConfig;
//! use rproxy::origin::HttpOrigin;
//! use rproxy::proxy::ProxyHandler;
//! use rproxy::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProxyConfig::from_env()?;
//!     let handler = Arc::new(ProxyHandler::new(
//!         config.ttl(),
//!         HttpOrigin::new(&config.origin),
//!         SystemClock,
//!     ));
//!
//!     let server = Server::bind(config.listen_addr()).await?;
//!     server
//!         .run(move |req| {
//!             let handler = Arc::clone(&handler);
//!             async move { handler.handle(req).await }
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod origin;
pub mod proxy;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheEntry, CacheStore, Clock, SystemClock};
pub use config::ProxyConfig;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use origin::{HttpOrigin, Origin, OriginResponse};
pub use proxy::ProxyHandler;
pub use server::{Server, ServerError};
