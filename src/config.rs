//! Broker configuration.
//!
//! Defaults, then an optional JSON file named by `RAFKA_CONFIG`, then
//! individual environment overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{DEFAULT_LISTEN_ADDRESS, DEFAULT_METADATA_LOG_PATH, MAX_MESSAGE_SIZE};

pub const CONFIG_PATH_ENV: &str = "RAFKA_CONFIG";
pub const LISTEN_ADDRESS_ENV: &str = "RAFKA_LISTEN_ADDR";
pub const METADATA_LOG_ENV: &str = "RAFKA_METADATA_LOG";
pub const MAX_MESSAGE_SIZE_ENV: &str = "RAFKA_MAX_MESSAGE_SIZE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub listen_address: String,
    pub metadata_log_path: PathBuf,
    pub max_message_size: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            metadata_log_path: PathBuf::from(DEFAULT_METADATA_LOG_PATH),
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl BrokerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies `RAFKA_*` overrides, with `lookup` standing in for the environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(LISTEN_ADDRESS_ENV) {
            self.listen_address = address;
        }
        if let Some(path) = lookup(METADATA_LOG_ENV) {
            self.metadata_log_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(MAX_MESSAGE_SIZE_ENV) {
            self.max_message_size = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: MAX_MESSAGE_SIZE_ENV,
                value: raw.clone(),
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // the frame length prefix is an int32
        if self.max_message_size == 0 || self.max_message_size > i32::MAX as usize {
            return Err(ConfigError::InvalidValue {
                key: "max_message_size",
                value: self.max_message_size.to_string(),
            });
        }
        if self.listen_address.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "listen_address",
                value: String::new(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_the_standard_broker_port() {
        let config = BrokerConfig::default();
        assert_eq!(config.listen_address, "0.0.0.0:9092");
        assert!(config
            .metadata_log_path
            .ends_with("__cluster_metadata-0/00000000000000000000.log"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BrokerConfig::from_json(r#"{ "listen_address": "127.0.0.1:19092" }"#).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:19092");
        assert_eq!(config.max_message_size, MAX_MESSAGE_SIZE);
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        assert!(matches!(
            BrokerConfig::from_json(r#"{ "port": 9092 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let env = HashMap::from([
            (METADATA_LOG_ENV, "/var/lib/meta.log"),
            (MAX_MESSAGE_SIZE_ENV, "4096"),
        ]);
        let mut config = BrokerConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.metadata_log_path, PathBuf::from("/var/lib/meta.log"));
        assert_eq!(config.max_message_size, 4096);
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = BrokerConfig::default();
        let err = config
            .apply_overrides(|key| (key == MAX_MESSAGE_SIZE_ENV).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: MAX_MESSAGE_SIZE_ENV, .. }));
    }

    #[test]
    fn zero_max_message_size_is_invalid() {
        let mut config = BrokerConfig::default();
        assert!(config
            .apply_overrides(|key| (key == MAX_MESSAGE_SIZE_ENV).then(|| "0".to_string()))
            .is_err());
    }

    #[test]
    fn reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "metadata_log_path": "/data/meta.log", "max_message_size": 1024 }}"#).unwrap();

        let config = BrokerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.metadata_log_path, PathBuf::from("/data/meta.log"));
        assert_eq!(config.max_message_size, 1024);
    }

    #[test]
    fn missing_config_file_is_read_error() {
        let err = BrokerConfig::from_file(Path::new("/nonexistent/rafka.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
