//! Settings loading.
//!
//! Precedence, lowest to highest:
//! 1. Programmatic defaults
//! 2. A JSON settings file (`settings.json` in the working directory, or an explicit path)
//! 3. Environment variables, `__` separating nested keys, e.g.
//!    `FCM_DJANGO_SETTINGS__FCM_SERVICE_ACCOUNT_KEY_PATH=/etc/fcm/key.json`
//!
//! Keys are lowercase; figment lowercases environment variable names.

use crate::app::DEFAULT_APP_NAME;
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;


const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Figment(Box<figment::Error>),
    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub fcm_django_settings: FcmSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            fcm_django_settings: FcmSettings::default(),
        }
    }
}

/// Push notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FcmSettings {
    /// Path to the service account JSON bundle.
    pub fcm_service_account_key_path: Option<String>,
    /// Name the Firebase app is registered under.
    pub app_name: String,
}

impl Default for FcmSettings {
    fn default() -> Self {
        Self {
            fcm_service_account_key_path: None,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl FcmSettings {
    pub fn with_key_path(path: impl Into<String>) -> Self {
        Self {
            fcm_service_account_key_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// The configured key path exactly as written, `None` when unset or blank.
    pub fn key_path(&self) -> Option<&str> {
        self.fcm_service_account_key_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

impl Settings {
    /// Loads settings from `settings.json` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(Path::new(DEFAULT_SETTINGS_FILE)))
    }

    /// Loads settings from an explicit file and the environment.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(path.as_ref()))
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Json::file(file))
            .merge(Env::raw().only(&["log_level"]))
            .merge(Env::prefixed("FCM_DJANGO_SETTINGS__").map(|key| {
                format!("fcm_django_settings.{}", key.as_str()).into()
            }))
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }
}
