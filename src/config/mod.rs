//! Startup configuration for the proxy.
//!
//! Three knobs: the listen port, the origin base URL, and the cache TTL.
//! The defaults reproduce the reference deployment; each can be overridden
//! through environment variables (`PORT`, `ORIGIN_URL`, `CACHE_TTL_SECS`)
//! or a JSON config file. None of them change at runtime.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Upstream origin used when `ORIGIN_URL` is unset.
pub const DEFAULT_ORIGIN: &str = "https://voucan-us4.github.io";

/// Cache TTL used when `CACHE_TTL_SECS` is unset: one day.
pub const DEFAULT_TTL_SECS: u64 = 86400;

/// Errors raised while resolving configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Proxy configuration: listen port, origin base URL, and cache TTL.
///
/// # Examples
///
/// ```
/// use rproxy::config::ProxyConfig;
///
/// let config = ProxyConfig::default();
/// assert_eq!(config.port, 3000);
/// assert_eq!(config.ttl().as_secs(), 86400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// TCP port the server listens on.
    pub port: u16,
    /// Origin base URL: scheme + authority, no trailing slash.
    pub origin: String,
    /// Cache entry time-to-live, in seconds.
    pub ttl_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            origin: DEFAULT_ORIGIN.to_owned(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl ProxyConfig {
    /// Resolves configuration from the environment, falling back to the
    /// defaults for any unset variable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when `PORT` or `CACHE_TTL_SECS` is set
    /// but does not parse as a number. A set-but-invalid variable is a
    /// startup error, not a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    // The lookup function stands in for the process environment so tests
    // never have to mutate it.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: port,
            })?;
        }
        if let Some(origin) = lookup("ORIGIN_URL") {
            config.origin = origin;
        }
        if let Some(ttl) = lookup("CACHE_TTL_SECS") {
            config.ttl_secs = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                var: "CACHE_TTL_SECS",
                value: ttl,
            })?;
        }

        Ok(config)
    }

    /// Loads configuration from a JSON file. Missing fields take their
    /// default values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read,
    /// [`ConfigError::Parse`] when it is not valid JSON for this shape.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Returns the TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the address to bind the listener to.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_deployment() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.origin, "https://voucan-us4.github.io");
        assert_eq!(config.ttl_secs, 86400);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn lookup_unset_yields_defaults() {
        let config = ProxyConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn lookup_overrides_apply() {
        let config = ProxyConfig::from_lookup(|var| match var {
            "PORT" => Some("8080".to_owned()),
            "ORIGIN_URL" => Some("http://origin.test".to_owned()),
            "CACHE_TTL_SECS" => Some("600".to_owned()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.origin, "http://origin.test");
        assert_eq!(config.ttl(), Duration::from_secs(600));
    }

    #[test]
    fn invalid_port_is_an_error_not_a_fallback() {
        let err = ProxyConfig::from_lookup(|var| match var {
            "PORT" => Some("not-a-port".to_owned()),
            _ => None,
        });
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue { var: "PORT", .. })
        ));
    }

    #[test]
    fn invalid_ttl_is_an_error() {
        let err = ProxyConfig::from_lookup(|var| match var {
            "CACHE_TTL_SECS" => Some("-5".to_owned()),
            _ => None,
        });
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue {
                var: "CACHE_TTL_SECS",
                ..
            })
        ));
    }

    #[test]
    fn json_with_all_fields() {
        let config: ProxyConfig = serde_json::from_str(
            r#"{"port": 8080, "origin": "http://localhost:9000", "ttl_secs": 60}"#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.origin, "http://localhost:9000");
        assert_eq!(config.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn json_missing_fields_take_defaults() {
        let config: ProxyConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.ttl_secs, DEFAULT_TTL_SECS);
    }

    #[test]
    fn json_round_trip() {
        let config = ProxyConfig {
            port: 4000,
            origin: "http://origin.test".to_owned(),
            ttl_secs: 120,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ProxyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = serde_json::from_str::<ProxyConfig>(r#"{"port": "not a number"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ProxyConfig::from_json_file("/nonexistent/rproxy.json");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
