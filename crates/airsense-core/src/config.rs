//! AirSense configuration.
//!
//! Every tunable the classifiers use lives here with the published
//! defaults, so a config file only needs the values it changes.
//!
//! # Example
//!
//! ```toml
//! [notifications]
//! suppression_window_secs = 300
//!
//! [inference]
//! endpoint = "https://inference.example.com/predict"
//! timeout_ms = 5000
//!
//! [breakpoints]
//! pm25 = [15.0, 55.0, 150.0, 250.0]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::breakpoints::BreakpointConfig;
use crate::events::DEFAULT_EVENT_BUFFER;
use crate::iot::IotThresholds;
use crate::remote::DEFAULT_MODEL_CONFIDENCE;
use crate::sinks::DEFAULT_TELEGRAM_API_BASE;

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the Telegram chat id.
pub const TELEGRAM_CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Longest accepted inference timeout.
const MAX_TIMEOUT_MS: u64 = 120_000;
/// Longest accepted suppression window (one day).
const MAX_SUPPRESSION_WINDOW_SECS: u64 = 86_400;

/// AirSense configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pollutant breakpoint tables.
    pub breakpoints: BreakpointConfig,
    /// Gas-index cutoffs.
    pub iot: IotThresholds,
    /// Notification gating.
    pub notifications: NotificationConfig,
    /// Remote model.
    pub inference: InferenceConfig,
    /// Reading persistence.
    pub history: HistoryConfig,
    /// Telegram push alerts.
    pub telegram: TelegramConfig,
    /// Event broadcast.
    pub events: EventsConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// # Example
    ///
    /// ```
    /// use airsense_core::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.breakpoints.validate());
        errors.extend(self.iot.validate());
        errors.extend(self.notifications.validate());
        errors.extend(self.inference.validate());
        errors.extend(self.history.validate());
        errors.extend(self.telegram.validate());
        errors.extend(self.events.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Notification gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Whether category changes raise notifications at all.
    pub enabled: bool,
    /// Hysteresis window in seconds.
    pub suppression_window_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suppression_window_secs: 600,
        }
    }
}

impl NotificationConfig {
    /// The suppression window as a signed duration.
    pub fn suppression_window(&self) -> time::Duration {
        time::Duration::seconds(self.suppression_window_secs.min(i64::MAX as u64) as i64)
    }

    /// Validate notification settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.suppression_window_secs > MAX_SUPPRESSION_WINDOW_SECS {
            errors.push(ValidationError {
                field: "notifications.suppression_window_secs".to_string(),
                message: format!(
                    "window {} is too long (maximum {} seconds / 1 day)",
                    self.suppression_window_secs, MAX_SUPPRESSION_WINDOW_SECS
                ),
            });
        }
        errors
    }
}

/// Remote model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Predict endpoint. Without one, pollutant readings use local rules only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bound on one inference call in milliseconds.
    pub timeout_ms: u64,
    /// Confidence reported when the model omits one.
    pub default_confidence: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            default_confidence: DEFAULT_MODEL_CONFIDENCE,
        }
    }
}

impl InferenceConfig {
    /// The call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate inference settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(endpoint) = &self.endpoint {
            errors.extend(validate_endpoint("inference.endpoint", endpoint));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            errors.push(ValidationError {
                field: "inference.timeout_ms".to_string(),
                message: format!(
                    "timeout {} ms must be between 1 and {} ms",
                    self.timeout_ms, MAX_TIMEOUT_MS
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            errors.push(ValidationError {
                field: "inference.default_confidence".to_string(),
                message: format!(
                    "confidence {} must be between 0 and 1",
                    self.default_confidence
                ),
            });
        }
        errors
    }
}

/// Reading persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Endpoint that accepts one JSON record per POST.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API key sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl HistoryConfig {
    /// Validate persistence settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(endpoint) = &self.endpoint {
            errors.extend(validate_endpoint("history.endpoint", endpoint));
        }
        if self.api_key.is_some() && self.endpoint.is_none() {
            errors.push(ValidationError {
                field: "history.api_key".to_string(),
                message: "api_key is set but history.endpoint is missing".to_string(),
            });
        }
        errors
    }
}

/// Telegram push alert settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token. Falls back to `TELEGRAM_BOT_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Target chat. Falls back to `TELEGRAM_CHAT_ID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Bot API base URL.
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

/// Resolved Telegram credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    /// Bot API token.
    pub bot_token: String,
    /// Target chat id.
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramConfig {
    /// Token and chat id from the file, or from the environment when absent.
    ///
    /// Returns `None` unless both are available.
    pub fn credentials(&self) -> Option<TelegramCredentials> {
        self.credentials_with(|key| std::env::var(key).ok())
    }

    fn credentials_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<TelegramCredentials> {
        let bot_token = self
            .bot_token
            .clone()
            .or_else(|| env(TELEGRAM_BOT_TOKEN_ENV))
            .filter(|t| !t.trim().is_empty())?;
        let chat_id = self
            .chat_id
            .clone()
            .or_else(|| env(TELEGRAM_CHAT_ID_ENV))
            .filter(|c| !c.trim().is_empty())?;
        Some(TelegramCredentials { bot_token, chat_id })
    }

    /// Validate Telegram settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = validate_endpoint("telegram.api_base", &self.api_base);
        if self.bot_token.is_some() != self.chat_id.is_some() {
            errors.push(ValidationError {
                field: "telegram".to_string(),
                message: "bot_token and chat_id must be set together".to_string(),
            });
        }
        errors
    }
}

/// Event broadcast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer size.
    pub buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl EventsConfig {
    /// Validate event settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        if self.buffer == 0 {
            vec![ValidationError {
                field: "events.buffer".to_string(),
                message: "buffer must be at least 1".to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

fn validate_endpoint(field: &str, url: &str) -> Vec<ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        vec![ValidationError {
            field: field.to_string(),
            message: "URL cannot be empty".to_string(),
        }]
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        vec![ValidationError {
            field: field.to_string(),
            message: format!("URL must start with http:// or https://, got: {}", url),
        }]
    } else {
        Vec::new()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The field path (e.g., `inference.timeout_ms` or `breakpoints.pm10[2]`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("airsense")
        .join("config.toml")
}
