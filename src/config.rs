//! Application configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;
use tracing::warn;

use crate::errors::TidePublisherError;

/// Default cache file, created beside the process working directory.
pub const DEFAULT_CACHE_PATH: &str = "tide_cache.json";
/// Default freshness window in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    pub cache: CacheConfig,
    /// Page carrying the tide table.
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub path: PathBuf,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl: Duration,
}

impl AppConfig {
    /// Load configuration, preferring environment variables and config files
    ///
    /// Environment keys map through the `_` separator: `MQTT_BROKER`,
    /// `MQTT_PORT`, `MQTT_USER`, `MQTT_PASS`, `URL`, `CACHE_PATH` and
    /// `CACHE_TTL` (seconds).
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("cache.path", DEFAULT_CACHE_PATH)?
            .set_default("cache.ttl", DEFAULT_CACHE_TTL_SECS)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::default().separator("_").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }
}

impl MqttConfig {
    /// Username/password pair when both are configured and non-empty.
    ///
    /// Anything less means an unauthenticated publish.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.pass.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user, pass))
            }
            _ => None,
        }
    }
}

impl CacheConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), TidePublisherError> {
        self.validate_path()?;
        self.validate_ttl()?;
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.ensure_directory_exists(dir)?;
        }
        Ok(())
    }

    fn validate_path(&self) -> Result<(), TidePublisherError> {
        if self.path.to_str().unwrap_or("").is_empty() {
            return Err(TidePublisherError::ConfigurationError {
                message: "Cache path cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_ttl(&self) -> Result<(), TidePublisherError> {
        if self.ttl.is_zero() {
            return Err(TidePublisherError::ConfigurationError {
                message: "Cache TTL must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn ensure_directory_exists(&self, dir: &Path) -> Result<(), TidePublisherError> {
        if !dir.exists() {
            warn!("Cache directory does not exist, attempting to create it");
            std::fs::create_dir_all(dir).map_err(|e| TidePublisherError::ConfigurationError {
                message: format!("Could not create cache directory: {}", e),
            })?;
        }
        Ok(())
    }
}
