//! Connection settings for the vector service.

use std::time::Duration;

use url::Url;

use crate::error::{Result, StoreError};

pub const HOST_ENV: &str = "SANDBOX_SEED_HOST";
pub const PORT_ENV: &str = "SANDBOX_SEED_PORT";
pub const API_KEY_ENV: &str = "SANDBOX_SEED_API_KEY";
pub const SCHEME_ENV: &str = "SANDBOX_SEED_SCHEME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub api_key: String,
    /// Connect timeout.
    pub init_timeout: Duration,
    /// Timeout for schema calls and read queries.
    pub query_timeout: Duration,
    pub insert_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            api_key: "test-key-123".to_string(),
            init_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(60),
            insert_timeout: Duration::from_secs(120),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `SANDBOX_SEED_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| StoreError::Config(format!("{PORT_ENV}={port} is not a port")))?;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            config.api_key = key.trim().to_string();
        }
        if let Some(scheme) = lookup(SCHEME_ENV) {
            config.scheme = scheme.trim().to_ascii_lowercase();
        }
        Ok(config)
    }

    pub fn base_url(&self) -> Result<Url> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(StoreError::Config(format!(
                "unsupported scheme `{}`",
                self.scheme
            )));
        }
        Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port))
            .map_err(|e| StoreError::Config(format!("bad service address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let env: HashMap<&str, &str> = [(HOST_ENV, "weaviate"), (PORT_ENV, "9090")].into();
        let config = StoreConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.host, "weaviate");
        assert_eq!(config.port, 9090);
        assert_eq!(config.api_key, "test-key-123");
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://weaviate:9090/"
        );
    }

    #[test]
    fn bad_port_and_scheme_are_config_errors() {
        let err = StoreConfig::from_lookup(|k| (k == PORT_ENV).then(|| "eighty".to_string()));
        assert!(matches!(err, Err(StoreError::Config(_))));

        let config = StoreConfig {
            scheme: "ftp".into(),
            ..StoreConfig::default()
        };
        assert!(matches!(config.base_url(), Err(StoreError::Config(_))));
    }
}
