//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. `STUDYLOG_*` environment variables (plain `DATABASE_URL` is used when
//!    `STUDYLOG_DATABASE_URL` is unset)
//! 2. `studylog.toml` in the working directory
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::display::display_offset;

pub const CONFIG_FILE: &str = "studylog.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

const fn default_offset_minutes() -> i32 {
    8 * 60
}

const fn default_initial_display() -> usize {
    6
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".studylog").join("session")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StudyLogConfig {
    /// Postgres connection string.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Static JSON file used instead of the database when set.
    #[serde(default)]
    pub records_file: Option<PathBuf>,

    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Offset used for dates shown to the user.
    #[serde(default = "default_offset_minutes")]
    pub display_utc_offset_minutes: i32,

    /// Records listed before `--all` is needed.
    #[serde(default = "default_initial_display")]
    pub initial_display: usize,
}

impl Default for StudyLogConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            records_file: None,
            session_file: default_session_file(),
            display_utc_offset_minutes: default_offset_minutes(),
            initial_display: default_initial_display(),
        }
    }
}

impl StudyLogConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }

    /// Loads `.env` from the working directory first, if present.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }

        if std::env::var_os("STUDYLOG_DATABASE_URL").is_none() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                figment = figment.merge(Serialized::default("database_url", url));
            }
        }

        figment.merge(Env::prefixed("STUDYLOG_"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(error) = display_offset(self.display_utc_offset_minutes) {
            return Err(ConfigError::InvalidValue {
                field: "display_utc_offset_minutes".to_string(),
                reason: error.to_string(),
            });
        }
        if self.initial_display == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_display".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn display_offset(&self) -> FixedOffset {
        display_offset(self.display_utc_offset_minutes)
            .unwrap_or_else(|_| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = StudyLogConfig::default();
        assert!(config.database_url.is_none());
        assert!(config.records_file.is_none());
        assert_eq!(config.session_file, PathBuf::from(".studylog/session"));
        assert_eq!(config.display_utc_offset_minutes, 480);
        assert_eq!(config.initial_display, 6);
        assert_eq!(config.display_offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "records_file = \"data/records.json\"\ndisplay_utc_offset_minutes = -300\n",
        )
        .unwrap();

        let config = StudyLogConfig::from_figment(
            Figment::from(Serialized::defaults(StudyLogConfig::default()))
                .merge(Toml::file(&path)),
        )
        .unwrap();
        assert_eq!(config.records_file, Some(PathBuf::from("data/records.json")));
        assert_eq!(config.display_utc_offset_minutes, -300);
        assert_eq!(config.initial_display, 6);
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let figment = Figment::from(Serialized::defaults(StudyLogConfig::default()))
            .merge(Serialized::default("display_utc_offset_minutes", 24 * 60));
        assert!(matches!(
            StudyLogConfig::from_figment(figment),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
