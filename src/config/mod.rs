//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file, then environment
//! variables override individual values:
//!
//! | Variable              | Field                     |
//! |-----------------------|---------------------------|
//! | `BOOKSTORE_HOST`      | `server.host`             |
//! | `BOOKSTORE_PORT`      | `server.port`             |
//! | `BOOKSTORE_MONGO_URI` | `storage.uri` (mongo)     |
//! | `BOOKSTORE_MONGO_DB`  | `storage.database` (mongo)|
//!
//! Setting `BOOKSTORE_MONGO_URI` switches the storage to MongoDB.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

pub const ENV_HOST: &str = "BOOKSTORE_HOST";
pub const ENV_PORT: &str = "BOOKSTORE_PORT";
pub const ENV_MONGO_URI: &str = "BOOKSTORE_MONGO_URI";
pub const ENV_MONGO_DB: &str = "BOOKSTORE_MONGO_DB";

const DEFAULT_DATABASE: &str = "bookstore";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow cross-origin requests from any origin (the storefront is served elsewhere)
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allow_any: true,
        }
    }
}

/// Which backend holds the data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    InMemory,
    Mongo {
        uri: String,
        #[serde(default = "default_database")]
        database: String,
    },
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise, then apply the
    /// process environment
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => {
                info!("no config file given, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = parse_var(ENV_PORT, &port)?;
        }

        let database = lookup(ENV_MONGO_DB);
        if let Some(uri) = lookup(ENV_MONGO_URI) {
            let current = match std::mem::take(&mut self.storage) {
                StorageConfig::Mongo { database, .. } => database,
                StorageConfig::InMemory => default_database(),
            };
            self.storage = StorageConfig::Mongo {
                uri,
                database: database.unwrap_or(current),
            };
        } else if let Some(database) = database {
            match &mut self.storage {
                StorageConfig::Mongo { database: current, .. } => *current = database,
                StorageConfig::InMemory => {
                    warn!("{ENV_MONGO_DB} is set without {ENV_MONGO_URI}, ignoring");
                }
            }
        }
        Ok(())
    }

    /// `host:port` to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert!(config.server.cors_allow_any);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
server:
  host: 0.0.0.0
  port: 8080
storage:
  backend: mongo
  uri: mongodb://localhost:27017
log:
  filter: debug
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(
            config.storage,
            StorageConfig::Mongo {
                uri: "mongodb://localhost:27017".to_string(),
                database: "bookstore".to_string(),
            }
        );
        assert_eq!(config.log.filter, "debug");
        assert!(config.server.cors_allow_any);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = AppConfig::from_yaml_str("server: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_yaml_file("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_HOST, "0.0.0.0"),
                (ENV_PORT, "9000"),
                (ENV_MONGO_URI, "mongodb://db:27017"),
                (ENV_MONGO_DB, "shop"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(
            config.storage,
            StorageConfig::Mongo {
                uri: "mongodb://db:27017".to_string(),
                database: "shop".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_PORT, .. }));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_database_without_uri_keeps_in_memory() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[(ENV_MONGO_DB, "shop")])).unwrap();
        assert_eq!(config.storage, StorageConfig::InMemory);
    }
}
