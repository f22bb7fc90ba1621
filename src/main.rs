//! rproxy binary: config resolution, subscriber setup, server wiring.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rproxy::cache::SystemClock;
use rproxy::config::ProxyConfig;
use rproxy::origin::HttpOrigin;
use rproxy::proxy::ProxyHandler;
use rproxy::server::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A config file wins over individual environment variables.
    let config = match std::env::var("RPROXY_CONFIG") {
        Ok(path) => ProxyConfig::from_json_file(path)?,
        Err(_) => ProxyConfig::from_env()?,
    };

    let server = Server::bind(config.listen_addr()).await?;
    info!(
        port = config.port,
        origin = %config.origin,
        ttl_secs = config.ttl_secs,
        "starting caching reverse proxy"
    );

    let handler = Arc::new(ProxyHandler::new(
        config.ttl(),
        HttpOrigin::new(&config.origin),
        SystemClock,
    ));

    server
        .run(move |req| {
            let handler = Arc::clone(&handler);
            async move { handler.handle(req).await }
        })
        .await?;

    Ok(())
}
