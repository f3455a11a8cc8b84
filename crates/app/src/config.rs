//! Runtime configuration.
//!
//! Values come from a TOML file (path in `CASHTRACK_CONFIG`, default
//! `cashtrack.toml`) and are then overridden by individual environment
//! variables. A missing file is not an error; every field has a default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CASHTRACK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "cashtrack.toml";

const DATABASE_PATH_ENV: &str = "CASHTRACK_DATABASE_PATH";
const POLL_INTERVAL_ENV: &str = "CASHTRACK_POLL_INTERVAL_SECS";
const RATES_ACCESS_KEY_ENV: &str = "CASHTRACK_RATES_ACCESS_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },
    #[error("No data directory available for the database")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub processor: ProcessorConfig,
    pub rates: RatesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `cashtrack.db` in the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Seconds between polls for pending reports.
    pub poll_interval_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub access_key: Option<String>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate.host".to_string(),
            timeout_secs: 10,
            access_key: None,
        }
    }
}

impl RatesConfig {
    /// Request timeout for the rate API, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Loads the config file named by `CASHTRACK_CONFIG` and applies env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Blank variables are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(DATABASE_PATH_ENV) {
            self.database.path = Some(PathBuf::from(path.trim()));
        }
        if let Some(value) = get(POLL_INTERVAL_ENV) {
            self.processor.poll_interval_secs =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        key: POLL_INTERVAL_ENV,
                        value,
                    })?;
        }
        if let Some(key) = get(RATES_ACCESS_KEY_ENV) {
            self.rates.access_key = Some(key.trim().to_string());
        }
        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("ch", "cashtrack", "Cashtrack")
            .ok_or(ConfigError::NoDataDir)?;
        Ok(dirs.data_dir().join("cashtrack.db"))
    }

    /// Never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.processor.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.rates.base_url, "https://api.exchangerate.host");
        assert_eq!(config.rates.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/var/lib/cashtrack/ledger.db"

            [rates]
            access_key = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/var/lib/cashtrack/ledger.db")
        );
        assert_eq!(config.rates.access_key.as_deref(), Some("secret"));
        assert_eq!(config.rates.timeout_secs, 10);
        assert_eq!(config.processor.poll_interval_secs, 10);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cashtrack.toml");
        std::fs::write(&path, "[processor]\npoll_interval_secs = \"soon\"\n").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CASHTRACK_DATABASE_PATH", "/tmp/other.db"),
            ("CASHTRACK_POLL_INTERVAL_SECS", " 30 "),
            ("CASHTRACK_RATES_ACCESS_KEY", "   "),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/other.db")));
        assert_eq!(config.processor.poll_interval_secs, 30);
        assert_eq!(config.rates.access_key, None);
    }

    #[test]
    fn bad_poll_interval_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| {
                (key == "CASHTRACK_POLL_INTERVAL_SECS").then(|| "ten".to_string())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride {
                key: "CASHTRACK_POLL_INTERVAL_SECS",
                ..
            }
        ));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let mut config = AppConfig::default();
        config.processor.poll_interval_secs = 0;
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_rates_timeout_is_clamped() {
        let rates = RatesConfig {
            timeout_secs: 0,
            ..RatesConfig::default()
        };
        assert_eq!(rates.timeout(), Duration::from_secs(1));
    }
}
