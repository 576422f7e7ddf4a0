//! Configuration for the demo program.
//!
//! Sources, lowest precedence first:
//! 1. Default values
//! 2. Configuration file (YAML)
//! 3. Environment variables prefixed with `LODE_`
//!
//! # Example
//!
//! ```ignore
//! use lode_demo::config::DemoConfig;
//!
//! // Load from file with env overrides
//! let config = DemoConfig::load("lode.yaml")?;
//!
//! // Or load from environment only
//! let config = DemoConfig::from_env()?;
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use lode_core::EngineConfig;
use lode_sqlx::PoolConfig;
use serde::{Deserialize, Serialize};

/// Demo configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DemoConfig {
    /// Loading engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Database connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DatabaseSettings {
    /// SQLite connection URL.
    ///
    /// Environment variable: `LODE_DATABASE__URL`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pool size.
    ///
    /// Environment variable: `LODE_DATABASE__MAX_CONNECTIONS`
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    /// Pool settings for the adapter.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::default()
            .with_url(self.url.clone())
            .with_max_connections(self.max_connections)
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    1
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON instead of human readable text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl DemoConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables use `__` between nested keys:
    /// - `LODE_ENGINE__BATCH_SIZE=100` overrides `engine.batch_size`
    /// - `LODE_DATABASE__URL=sqlite://catalog.db` overrides `database.url`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&DemoConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let demo_config: DemoConfig = config.try_deserialize()?;
        demo_config.validate()?;

        Ok(demo_config)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&DemoConfig::default())?)
            .add_source(env_source())
            .build()?;

        let demo_config: DemoConfig = config.try_deserialize()?;
        demo_config.validate()?;

        Ok(demo_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.engine
            .validate()
            .map_err(|err| ConfigLoadError::Invalid {
                message: err.to_string(),
            })?;

        if self.database.url.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "database.url must not be empty".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "database.max_connections must be greater than 0".to_string(),
            });
        }

        // Every connection to an in-memory database opens a fresh one.
        if self.database.is_in_memory() && self.database.max_connections != 1 {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "database.max_connections must be 1 for in-memory databases, got: {}",
                    self.database.max_connections
                ),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("LODE")
        .prefix_separator("_")
        .separator("__")
}
