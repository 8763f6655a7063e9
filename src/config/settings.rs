use crate::error::ConfigError;
use log::{info, warn};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Public Telegram Bot API host
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Environment variable consulted when the config file carries no bot token
pub const TOKEN_ENV_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable consulted when the config file carries no chat id
pub const CHAT_ID_ENV_VAR: &str = "TELEGRAM_CHAT_ID";

/// Top-level configuration loaded from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot API connection settings
    pub telegram: TelegramConfig,
    /// Pointers printed at the bottom of the daily summary
    pub report: ReportConfig,
}

/// Telegram connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token, either literal or a `${ENV_VAR}` reference
    pub bot_token: Option<String>,
    /// Target chat, written as a string or an integer in the file
    pub chat_id: Option<ChatIdValue>,
    /// Base URL of the Bot API
    pub api_base: String,
    /// Timeout for `sendMessage` requests
    pub message_timeout_secs: u64,
    /// Timeout for `sendDocument` uploads
    pub file_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_API_BASE.to_string(),
            message_timeout_secs: 10,
            file_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("message_timeout_secs", &self.message_timeout_secs)
            .field("file_timeout_secs", &self.file_timeout_secs)
            .finish()
    }
}

/// Chat identifiers may be numeric (`-100123`) or a channel handle (`"@name"`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChatIdValue {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ChatIdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatIdValue::Numeric(id) => write!(f, "{}", id),
            ChatIdValue::Text(id) => f.write_str(id),
        }
    }
}

/// Data locations referenced by the daily summary footer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub data_dir: String,
    pub reports_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_dir: "market_data/".to_string(),
            reports_dir: "analysis_reports/".to_string(),
        }
    }
}

/// Resolved bot credentials
///
/// Immutable once built. The token is kept out of `Debug` output so that
/// credentials can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    bot_token: String,
    chat_id: String,
}

impl Credentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// * `ConfigError::ReadError` if the file cannot be read
    /// * `ConfigError::TomlError` if the contents are not valid TOML for this schema
    /// * `ConfigError::ValidationError` if a value is out of range
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    ///
    /// Unreadable files only produce a warning because credentials can still
    /// come from the environment. Malformed files are reported as errors.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                match Self::from_file(path) {
                    Err(ConfigError::ReadError(reason)) => {
                        warn!(
                            "Configuration file not readable ({}), using environment only",
                            reason
                        );
                        Ok(Self::default())
                    }
                    other => other,
                }
            }
            None => {
                info!("No configuration file given, using environment only");
                Ok(Self::default())
            }
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let telegram = &self.telegram;

        if !(telegram.api_base.starts_with("http://") || telegram.api_base.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "api_base must be an http(s) URL, got '{}'",
                telegram.api_base
            )));
        }

        if telegram.message_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "message_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if telegram.file_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "file_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve credentials against the process environment
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolve credentials using the given environment lookup
    ///
    /// File values win; the `TELEGRAM_*` variables only fill in what the
    /// file leaves out. A token written as `${NAME}` is read from `NAME`.
    pub fn credentials_with<F>(&self, env: F) -> Result<Credentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = match &self.telegram.bot_token {
            Some(token) => resolve_env_reference(token, &env)?,
            None => env(TOKEN_ENV_VAR).unwrap_or_default(),
        };
        let bot_token = bot_token.trim().to_string();
        if bot_token.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Telegram bot token is not set (config or {})",
                TOKEN_ENV_VAR
            )));
        }

        let chat_id = match &self.telegram.chat_id {
            Some(ChatIdValue::Text(text)) => resolve_env_reference(text, &env)?,
            Some(numeric) => numeric.to_string(),
            None => env(CHAT_ID_ENV_VAR).unwrap_or_default(),
        };
        let chat_id = chat_id.trim().to_string();
        if chat_id.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Telegram chat id is not set (config or {})",
                CHAT_ID_ENV_VAR
            )));
        }

        Ok(Credentials::new(bot_token, chat_id))
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.message_timeout_secs)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.file_timeout_secs)
    }
}

/// Expand a `${NAME}` value from the environment, passing literals through
fn resolve_env_reference<F>(value: &str, env: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !value.starts_with("${") {
        return Ok(value.to_string());
    }

    let name = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ConfigError::ParseError(format!("Malformed environment reference: {}", value))
        })?;

    env(name).ok_or_else(|| {
        ConfigError::ValidationError(format!("Environment variable '{}' is not set", name))
    })
}
