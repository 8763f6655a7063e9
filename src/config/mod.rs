/// TOML configuration and credential resolution
pub mod settings;

pub use settings::{
    ChatIdValue, Config, Credentials, ReportConfig, TelegramConfig, CHAT_ID_ENV_VAR,
    DEFAULT_API_BASE, TOKEN_ENV_VAR,
};
