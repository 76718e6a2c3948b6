//! Daemon configuration
//!
//! A flat JSON object, read once at startup. Every key is optional.
//!
//! ```json
//! {
//!   "dbFile": "db.json",
//!   "authFolder": "auth",
//!   "welcomeText": "Hi! Thanks for reaching out, an operator will reply shortly.",
//!   "welcomeIntervalHours": 6,
//!   "rateLimitPerMinute": 30,
//!   "bridgeUrl": "http://127.0.0.1:8080"
//! }
//! ```

use crate::maintenance::SweepSettings;
use crate::runtime::{ReconnectPolicy, WelcomeSettings};
use crate::state_machine::WelcomePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "AUTO_WELCOME_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub const DEFAULT_WELCOME_TEXT: &str =
    "Halo 👋, terima kasih sudah menghubungi. Admin akan segera membalas.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub db_file: PathBuf,
    pub auth_folder: PathBuf,
    pub welcome_text: String,
    pub welcome_interval_hours: f64,
    pub rate_limit_per_minute: u32,
    /// Base URL of the chat bridge
    pub bridge_url: String,
    pub reconnect_delay_secs: u64,
    pub send_timeout_secs: u64,
    pub eviction_interval_hours: u64,
    pub retention_days: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: PathBuf::from("db.json"),
            auth_folder: PathBuf::from("auth"),
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            welcome_interval_hours: 6.0,
            rate_limit_per_minute: 30,
            bridge_url: "http://127.0.0.1:8080".to_string(),
            reconnect_delay_secs: 3,
            send_timeout_secs: 30,
            eviction_interval_hours: 6,
            retention_days: 30,
        }
    }
}

impl Config {
    /// Config file path from the environment, or the default
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Load and validate. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.welcome_text.trim().is_empty() {
            return Err(invalid("welcomeText", "must not be empty"));
        }
        self.welcome_interval()?;
        if self.rate_limit_per_minute == 0 {
            return Err(invalid("rateLimitPerMinute", "must be at least 1"));
        }
        if self.send_timeout_secs == 0 {
            return Err(invalid("sendTimeoutSecs", "must be at least 1"));
        }
        if self.eviction_interval_hours == 0 {
            return Err(invalid("evictionIntervalHours", "must be at least 1"));
        }
        if self.retention_days == 0 {
            return Err(invalid("retentionDays", "must be at least 1"));
        }
        Ok(())
    }

    /// Cooldown between welcomes
    pub fn welcome_interval(&self) -> Result<Duration, ConfigError> {
        let hours = self.welcome_interval_hours;
        if !hours.is_finite() || hours <= 0.0 {
            return Err(invalid("welcomeIntervalHours", format!("{hours} is not a positive number")));
        }
        Duration::try_from_secs_f64(hours * 3600.0)
            .map_err(|e| invalid("welcomeIntervalHours", e.to_string()))
    }

    pub fn welcome_settings(&self) -> Result<WelcomeSettings, ConfigError> {
        Ok(WelcomeSettings {
            text: self.welcome_text.clone(),
            policy: WelcomePolicy::new(self.welcome_interval()?),
            send_timeout: Duration::from_secs(self.send_timeout_secs),
        })
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_secs(self.reconnect_delay_secs),
            max_attempts: None,
        }
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            interval: Duration::from_secs(self.eviction_interval_hours.saturating_mul(3600)),
            retention: Duration::from_secs(self.retention_days.saturating_mul(86_400)),
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
