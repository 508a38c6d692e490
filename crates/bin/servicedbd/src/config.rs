//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `servicedb.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;

use serde::Deserialize;

use servicedb_adapter_storage_sqlite_sqlx::EngineConfig;
use servicedb_app::fanout::NotificationPolicy;
use servicedb_app::service::{DEFAULT_MAILBOX_CAPACITY, ServiceConfig};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store file locations.
    pub storage: StorageConfig,
    /// Actor settings.
    pub service: ServiceSection,
    /// Notification channel settings.
    pub notifications: NotificationsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every writable store and agent database.
    pub user_dir: PathBuf,
    /// Directory holding read-only asset databases.
    pub assets_dir: PathBuf,
    /// Connections per store pool.
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Requests queued before senders wait.
    pub mailbox_capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Also notify after operations that failed.
    pub emit_on_failure: bool,
    /// Events buffered per subscriber before it lags.
    pub capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `servicedb.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("servicedb.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SERVICEDB_USER_DIR") {
            self.storage.user_dir = val.into();
        }
        if let Ok(val) = std::env::var("SERVICEDB_ASSETS_DIR") {
            self.storage.assets_dir = val.into();
        }
        if let Ok(val) = std::env::var("SERVICEDB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.user_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.user_dir must not be empty".to_string(),
            ));
        }
        if self.storage.assets_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.assets_dir must not be empty".to_string(),
            ));
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Validation(
                "storage.max_connections must be non-zero".to_string(),
            ));
        }
        if self.service.mailbox_capacity == 0 {
            return Err(ConfigError::Validation(
                "service.mailbox_capacity must be non-zero".to_string(),
            ));
        }
        if self.notifications.capacity == 0 {
            return Err(ConfigError::Validation(
                "notifications.capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            user_dir: self.storage.user_dir.clone(),
            assets_dir: self.storage.assets_dir.clone(),
            max_connections: self.storage.max_connections,
        }
    }

    #[must_use]
    pub fn service(&self) -> ServiceConfig {
        let policy = if self.notifications.emit_on_failure {
            NotificationPolicy::Always
        } else {
            NotificationPolicy::OnSuccess
        };
        ServiceConfig {
            mailbox_capacity: self.service.mailbox_capacity,
            policy,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_dir: PathBuf::from("user"),
            assets_dir: PathBuf::from("assets"),
            max_connections: 1,
        }
    }
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            emit_on_failure: true,
            capacity: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "servicedbd=info,servicedb_app=info,servicedb_adapter_storage_sqlite_sqlx=info"
                .to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.user_dir, PathBuf::from("user"));
        assert_eq!(config.storage.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.service.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert!(config.notifications.emit_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.max_connections, 1);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [storage]
            user_dir = '/data/user'
            assets_dir = '/data/assets'
            max_connections = 2

            [service]
            mailbox_capacity = 8

            [notifications]
            emit_on_failure = false
            capacity = 16

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.user_dir, PathBuf::from("/data/user"));
        assert_eq!(config.storage.assets_dir, PathBuf::from("/data/assets"));
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.service.mailbox_capacity, 8);
        assert!(!config.notifications.emit_on_failure);
        assert_eq!(config.notifications.capacity, 16);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.storage.user_dir, PathBuf::from("user"));
    }

    #[test]
    fn should_reject_zero_mailbox_capacity() {
        let mut config = Config::default();
        config.service.mailbox_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_user_dir() {
        let mut config = Config::default();
        config.storage.user_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_notify_on_success_only_when_failures_are_silenced() {
        let mut config = Config::default();
        assert_eq!(config.service().policy, NotificationPolicy::Always);
        config.notifications.emit_on_failure = false;
        assert_eq!(config.service().policy, NotificationPolicy::OnSuccess);
    }

    #[test]
    fn should_map_storage_section_onto_engine_config() {
        let config = Config::default();
        let engine = config.engine();
        assert_eq!(engine.user_dir, config.storage.user_dir);
        assert_eq!(engine.max_connections, 1);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
