//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every value has a default so a bare environment works.

use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub messaging: MessagingConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: Environment::default(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment {other:?}")),
        }
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Public channels users may open
    #[serde(default = "default_public_channels")]
    pub public_channels: Vec<String>,
    /// Gap between two messages of one sender that starts a new header
    #[serde(default = "default_header_gap_secs")]
    pub header_gap_secs: u64,
    /// Maximum message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// How recent `last_login` must be to show a user as recently active
    #[serde(default = "default_presence_window_secs")]
    pub presence_window_secs: u64,
}

impl MessagingConfig {
    #[must_use]
    pub fn header_gap(&self) -> Duration {
        clamped_seconds(self.header_gap_secs)
    }

    #[must_use]
    pub fn presence_window(&self) -> Duration {
        clamped_seconds(self.presence_window_secs)
    }

    #[must_use]
    pub fn is_public_channel(&self, name: &str) -> bool {
        self.public_channels.iter().any(|c| c == name)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            public_channels: default_public_channels(),
            header_gap_secs: default_header_gap_secs(),
            max_message_length: default_max_message_length(),
            presence_window_secs: default_presence_window_secs(),
        }
    }
}

/// In-memory store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Number of most recent messages included in each snapshot
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Snowflake worker id
    #[serde(default)]
    pub worker_id: u16,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            worker_id: 0,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

// Default value functions
fn default_app_name() -> String {
    "chat-core".to_string()
}

fn default_public_channels() -> Vec<String> {
    ["general", "random", "help"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_header_gap_secs() -> u64 {
    300 // 5 minutes
}

fn default_max_message_length() -> usize {
    2000
}

fn default_presence_window_secs() -> u64 {
    300
}

/// Snowflake worker ids are 10 bits wide
const MAX_WORKER_ID: u16 = 1023;

fn default_history_limit() -> usize {
    200
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let worker_id: u16 = parse_var(&lookup, "STORE_WORKER_ID", defaults.store.worker_id)?;
        if worker_id > MAX_WORKER_ID {
            return Err(ConfigError::InvalidValue("STORE_WORKER_ID", worker_id.to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or(defaults.app.name),
                env: parse_var(&lookup, "APP_ENV", defaults.app.env)?,
            },
            messaging: MessagingConfig {
                public_channels: lookup("MESSAGING_PUBLIC_CHANNELS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|c| !c.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or(defaults.messaging.public_channels),
                header_gap_secs: parse_secs(&lookup, "MESSAGING_HEADER_GAP_SECS", defaults.messaging.header_gap_secs)?,
                max_message_length: parse_var(
                    &lookup,
                    "MESSAGING_MAX_MESSAGE_LENGTH",
                    defaults.messaging.max_message_length,
                )?,
                presence_window_secs: parse_secs(&lookup, "MESSAGING_PRESENCE_WINDOW_SECS", defaults.messaging.presence_window_secs)?,
            },
            store: StoreConfig {
                history_limit: parse_var(&lookup, "STORE_HISTORY_LIMIT", defaults.store.history_limit)?,
                worker_id,
            },
            logging: LoggingConfig {
                format: parse_var(&lookup, "LOG_FORMAT", defaults.logging.format)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default),
    }
}

/// Parse a number of seconds that must fit a `chrono::Duration`
fn parse_secs<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_var(lookup, key, default)?;
    match i64::try_from(secs).ok().and_then(Duration::try_seconds) {
        Some(_) => Ok(secs),
        None => Err(ConfigError::InvalidValue(key, secs.to_string())),
    }
}

/// Seconds as a `Duration`, saturating at the largest representable span
fn clamped_seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
