use {
    crate::buffer::DEFAULT_CAPACITY,
    std::{env, path::PathBuf, time::Duration},
};

pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:3001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub identity: Option<String>,
    pub contract_filter: Option<String>,
    pub access_db_path: PathBuf,
    pub buffer_capacity: usize,
    /// `None` keeps waiting for a connection attempt indefinitely
    pub connect_timeout: Option<Duration>,
    pub export_dir: PathBuf,
    pub signer_cmd: Option<String>,
    pub channel_buffer: usize,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LIGHTOMBO_BACKEND_URL` (default: ws://localhost:3001)
    /// - `LIGHTOMBO_IDENTITY` (wallet address; required to stream)
    /// - `LIGHTOMBO_CONTRACT` (optional contract filter)
    /// - `LIGHTOMBO_ACCESS_DB` (default: data/lightombo.db)
    /// - `LIGHTOMBO_BUFFER_CAPACITY` (default: 100)
    /// - `LIGHTOMBO_CONNECT_TIMEOUT_MS` (default: none)
    /// - `LIGHTOMBO_EXPORT_DIR` (default: .)
    /// - `LIGHTOMBO_SIGNER_CMD` (optional external signer)
    /// - `LIGHTOMBO_CHANNEL_BUFFER` (default: 1000)
    /// - `RUST_LOG` (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let buffer_capacity = parse_or(&non_empty, "LIGHTOMBO_BUFFER_CAPACITY", DEFAULT_CAPACITY)?;
        if buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "LIGHTOMBO_BUFFER_CAPACITY must be greater than 0".to_string(),
            ));
        }

        let channel_buffer = parse_or(&non_empty, "LIGHTOMBO_CHANNEL_BUFFER", 1_000usize)?;
        if channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "LIGHTOMBO_CHANNEL_BUFFER must be greater than 0".to_string(),
            ));
        }

        let connect_timeout = match non_empty("LIGHTOMBO_CONNECT_TIMEOUT_MS") {
            Some(raw) => Some(Duration::from_millis(raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!("LIGHTOMBO_CONNECT_TIMEOUT_MS='{}'", raw))
            })?)),
            None => None,
        };

        Ok(Self {
            backend_url: non_empty("LIGHTOMBO_BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            identity: non_empty("LIGHTOMBO_IDENTITY"),
            contract_filter: non_empty("LIGHTOMBO_CONTRACT"),
            access_db_path: non_empty("LIGHTOMBO_ACCESS_DB")
                .unwrap_or_else(|| "data/lightombo.db".to_string())
                .into(),
            buffer_capacity,
            connect_timeout,
            export_dir: non_empty("LIGHTOMBO_EXPORT_DIR")
                .unwrap_or_else(|| ".".to_string())
                .into(),
            signer_cmd: non_empty("LIGHTOMBO_SIGNER_CMD"),
            channel_buffer,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Identity to gate on; streaming is impossible without one
    pub fn require_identity(&self) -> Result<&str, ConfigError> {
        self.identity
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVariable("LIGHTOMBO_IDENTITY".to_string()))
    }
}

fn parse_or<T: std::str::FromStr>(
    non_empty: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match non_empty(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{}='{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.backend_url, "ws://localhost:3001");
        assert_eq!(config.identity, None);
        assert_eq!(config.contract_filter, None);
        assert_eq!(config.access_db_path, PathBuf::from("data/lightombo.db"));
        assert_eq!(config.buffer_capacity, 100);
        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.channel_buffer, 1_000);
        assert_eq!(config.rust_log, "info");
        assert!(config.require_identity().is_err());
    }

    #[test]
    fn test_custom_config() {
        let config = config_from(&[
            ("LIGHTOMBO_BACKEND_URL", "https://feed.example.com"),
            ("LIGHTOMBO_IDENTITY", "0xAbC"),
            ("LIGHTOMBO_CONTRACT", "  "),
            ("LIGHTOMBO_BUFFER_CAPACITY", "250"),
            ("LIGHTOMBO_CONNECT_TIMEOUT_MS", "1500"),
            ("LIGHTOMBO_SIGNER_CMD", "wallet-cli sign"),
        ])
        .unwrap();

        assert_eq!(config.backend_url, "https://feed.example.com");
        assert_eq!(config.require_identity().unwrap(), "0xAbC");
        assert_eq!(config.contract_filter, None);
        assert_eq!(config.buffer_capacity, 250);
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.signer_cmd.as_deref(), Some("wallet-cli sign"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("LIGHTOMBO_BUFFER_CAPACITY", "lots")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            config_from(&[("LIGHTOMBO_BUFFER_CAPACITY", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            config_from(&[("LIGHTOMBO_CONNECT_TIMEOUT_MS", "-5")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
