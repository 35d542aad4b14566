//! Daemon configuration
//!
//! Environment variables only:
//!
//! - `DYNDNS_LISTEN_ADDR`: socket address to bind (default `0.0.0.0:8080`)
//! - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//! - `DYNDNS_PROVIDER`, `DYNDNS_STORAGE` and their backend options, see
//!   [`dyndns53_core::config`]

use anyhow::{Context, Result};
use dyndns53_core::config::{ENV_LOG_LEVEL, ProviderConfig, StorageConfig, parse_log_level};
use std::net::SocketAddr;
use tracing::Level;

/// Socket address selector
pub const ENV_LISTEN_ADDR: &str = "DYNDNS_LISTEN_ADDR";

/// Default socket address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Complete daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Address to listen on
    pub listen_addr: SocketAddr,
    /// Maximum log level
    pub log_level: Level,
    /// Zone backend
    pub provider: ProviderConfig,
    /// Credential database backend
    pub storage: StorageConfig,
}

impl DaemonConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(dyndns53_core::config::env_lookup)
    }

    /// Load configuration using `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = lookup(ENV_LISTEN_ADDR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen.trim().parse().with_context(|| {
            format!(
                "{} '{}' is not a valid socket address (e.g. 0.0.0.0:8080)",
                ENV_LISTEN_ADDR, listen
            )
        })?;

        let log_level = match lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            Some(level) => parse_log_level(&level)?,
            None => Level::INFO,
        };

        Ok(Self {
            listen_addr,
            log_level,
            provider: ProviderConfig::from_lookup(&lookup)?,
            storage: StorageConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const LOCAL: &[(&str, &str)] = &[
        ("DYNDNS_PROVIDER", "memory"),
        ("DYNDNS_MEMORY_ZONES", "example.com"),
        ("DYNDNS_STORAGE", "file"),
        ("DYNDNS_DATABASE_PATH", "/tmp/hosts.csv"),
    ];

    #[test]
    fn defaults() {
        let config = DaemonConfig::from_lookup(lookup_from(LOCAL)).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.provider.type_name(), "memory");
        assert_eq!(config.storage.type_name(), "file");
    }

    #[test]
    fn overrides() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("DYNDNS_LISTEN_ADDR", "127.0.0.1:9000"));
        pairs.push(("DYNDNS_LOG_LEVEL", "debug"));

        let config = DaemonConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn invalid_values() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("DYNDNS_LISTEN_ADDR", "localhost"));
        let err = DaemonConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("DYNDNS_LISTEN_ADDR"));

        let mut pairs = LOCAL.to_vec();
        pairs.push(("DYNDNS_LOG_LEVEL", "loud"));
        assert!(DaemonConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn route53_requires_credentials() {
        let err = DaemonConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("AWS_ACCESS_KEY_ID"));
    }
}
