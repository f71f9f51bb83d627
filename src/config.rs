//! Layered configuration: built-in defaults, then an optional TOML file,
//! then `COPILOT_*` environment variables. CLI flags are applied last by
//! the caller.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::ingest::{Pacer, ScrapeSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Defaults to `career-copilot.db` in the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub max_jobs_per_source: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_jobs_per_source: 15,
            min_delay_ms: 1500,
            max_delay_ms: 4000,
            timeout_secs: 30,
        }
    }
}

impl ScraperConfig {
    pub fn pacer(&self) -> Pacer {
        if self.max_delay_ms == 0 {
            return Pacer::disabled();
        }
        Pacer::new(
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settings(&self, dry_run: bool) -> ScrapeSettings {
        ScrapeSettings {
            max_jobs_per_source: self.max_jobs_per_source,
            dry_run,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Installs the global tracing subscriber. `RUST_LOG` wins over the
    /// configured level; `verbose` forces `debug`. Logs go to stderr.
    pub fn init(&self, verbose: bool) {
        let level = if verbose { "debug" } else { self.level.as_str() };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Config {
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given (it must exist), else the default config
    /// file when present, else defaults. Environment overrides are applied
    /// on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
                Self::parse_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `COPILOT_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("COPILOT_DB_PATH").filter(|p| !p.is_empty()) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(max) = lookup("COPILOT_MAX_JOBS_PER_SOURCE") {
            self.scraper.max_jobs_per_source =
                max.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "COPILOT_MAX_JOBS_PER_SOURCE",
                    reason: format!("'{}' is not a whole number", max),
                })?;
        }
        if let Some(level) = lookup("COPILOT_LOG_LEVEL").filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
        self.validate()
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(crate::db::default_path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.max_jobs_per_source == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_jobs_per_source",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.scraper.min_delay_ms > self.scraper.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "min_delay_ms",
                reason: "must not exceed max_delay_ms".to_string(),
            });
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("'{}' is not one of pretty, json", self.logging.format),
            });
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "career-copilot")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.database.path.is_none());
        assert_eq!(config.scraper.max_jobs_per_source, 15);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::parse_toml(
            r#"
[scraper]
max_jobs_per_source = 5

[logging]
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(config.scraper.max_jobs_per_source, 5);
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::parse_toml("[scraper]\nmax_jobs_per_source = 0"),
            Err(ConfigError::InvalidValue { field: "max_jobs_per_source", .. })
        ));
        assert!(matches!(
            Config::parse_toml("[logging]\nformat = \"xml\""),
            Err(ConfigError::InvalidValue { field: "format", .. })
        ));
        assert!(matches!(
            Config::parse_toml("[scraper]\nmin_delay_ms = 10\nmax_delay_ms = 5"),
            Err(ConfigError::InvalidValue { field: "min_delay_ms", .. })
        ));
        assert!(matches!(Config::parse_toml("[scraper"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("COPILOT_DB_PATH", "/tmp/jobs.db"),
                ("COPILOT_MAX_JOBS_PER_SOURCE", " 40 "),
                ("COPILOT_LOG_LEVEL", "warn"),
            ]))
            .unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/jobs.db"));
        assert_eq!(config.scraper.max_jobs_per_source, 40);
        assert_eq!(config.logging.level, "warn");

        let err = config
            .apply_overrides(env(&[("COPILOT_MAX_JOBS_PER_SOURCE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("COPILOT_MAX_JOBS_PER_SOURCE"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copilot.toml");
        let db_path = dir.path().join("data.db");
        std::fs::write(
            &path,
            format!("[database]\npath = {:?}\n", db_path.to_string_lossy()),
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        if std::env::var("COPILOT_DB_PATH").is_err() {
            assert_eq!(config.database_path(), db_path);
        }
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_scraper_settings() {
        let scraper = ScraperConfig::default();
        assert_eq!(scraper.timeout(), Duration::from_secs(30));
        let settings = scraper.settings(true);
        assert!(settings.dry_run);
        assert_eq!(settings.max_jobs_per_source, 15);
    }
}
