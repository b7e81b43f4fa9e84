use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use common::sharing::{SharingConfig, DEFAULT_MAIL_TIMEOUT, DEFAULT_STORE_TIMEOUT};
use serde::{Deserialize, Serialize};
use url::Url;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// public origin of the web app, used for public links,
    ///  invite signup links and dashboard links
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// deadline in milliseconds for each store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// deadline in milliseconds for each outgoing email
    #[serde(default = "default_mail_timeout_ms")]
    pub mail_timeout_ms: u64,

    // misc
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// when false, notices are dropped instead of sent
    #[serde(default = "default_email_enabled")]
    pub email_enabled: bool,
}

fn default_base_url() -> Url {
    SharingConfig::default().base_url
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT.as_millis() as u64
}

fn default_mail_timeout_ms() -> u64 {
    DEFAULT_MAIL_TIMEOUT.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_email_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            store_timeout_ms: default_store_timeout_ms(),
            mail_timeout_ms: default_mail_timeout_ms(),
            log_level: default_log_level(),
            email_enabled: default_email_enabled(),
        }
    }
}

impl Config {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.display().to_string()));
        }
        let config_toml = std::fs::read_to_string(path)?;
        Self::from_toml_str(&config_toml)
    }

    /// Parse and validate a config from TOML. Missing keys take their
    ///  defaults.
    pub fn from_toml_str(config_toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("store_timeout_ms"));
        }
        if self.mail_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("mail_timeout_ms"));
        }
        match self.base_url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_millis(self.mail_timeout_ms)
    }

    /// The subset of settings the sharing engine consumes
    pub fn sharing(&self) -> SharingConfig {
        SharingConfig {
            base_url: self.base_url.clone(),
            store_timeout: self.store_timeout(),
            mail_timeout: self.mail_timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    MissingFile(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("base_url must be http or https, got {0}")]
    UnsupportedScheme(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_takes_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url.as_str(), "http://localhost:5173/");
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert!(config.email_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_toml_str(
            r#"
            base_url = "https://vault.example.com"
            store_timeout_ms = 250
            log_level = "debug"
            email_enabled = false
            "#,
        )
        .unwrap();

        let sharing = config.sharing();
        assert_eq!(sharing.base_url.host_str(), Some("vault.example.com"));
        assert_eq!(sharing.store_timeout, Duration::from_millis(250));
        assert_eq!(sharing.mail_timeout, DEFAULT_MAIL_TIMEOUT);
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
        assert!(!config.email_enabled);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml_str(r#"log_level = "loud""#),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            Config::from_toml_str("store_timeout_ms = 0"),
            Err(ConfigError::ZeroTimeout("store_timeout_ms"))
        ));
        assert!(matches!(
            Config::from_toml_str(r#"base_url = "not a url""#),
            Err(ConfigError::TomlDe(_))
        ));
        assert!(matches!(
            Config::from_toml_str(r#"base_url = "ftp://vault.example.com""#),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_load_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        assert!(matches!(Config::load(&path), Err(ConfigError::MissingFile(_))));

        let config = Config {
            email_enabled: false,
            ..Config::default()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
