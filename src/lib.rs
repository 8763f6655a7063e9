/// Error types for delivery and configuration
pub mod error;

/// Alert batch model and message formatting
pub mod alerts;

/// Configuration management
pub mod config;

/// Telegram Bot API client
pub mod telegram;

// Re-export commonly used types
pub use alerts::{AlertBatch, Level};
pub use config::{Config, Credentials};
pub use error::{ConfigError, NotifyError};
pub use telegram::Notifier;
