use crate::alerts::{format_digest, format_error_alert, format_summary, AlertBatch, Level};
use crate::config::{Config, Credentials, ReportConfig, DEFAULT_API_BASE};
use crate::error::{ConfigError, NotifyError};
use crate::telegram::transport::{DocumentUpload, HttpTransport, MessagePayload, Transport};
use chrono::{Local, NaiveDateTime};
use log::{debug, error, info};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Timeout for `sendMessage` calls
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for `sendDocument` uploads
pub const FILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends monitoring summaries and alerts to a Telegram chat
///
/// Every operation is a single, independent request/response exchange
/// with the Bot API. Delivery is best-effort: failures are logged and never
/// returned to the caller. Use [`Notifier::try_send_message`] and
/// [`Notifier::try_send_file`] when the outcome matters.
///
/// The notifier holds no mutable state and performs blocking I/O.
pub struct Notifier<T: Transport = HttpTransport> {
    credentials: Credentials,
    api_base: String,
    message_timeout: Duration,
    file_timeout: Duration,
    report: ReportConfig,
    transport: T,
}

impl Notifier<HttpTransport> {
    /// Build a notifier talking to the Bot API configured in `config`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` when credentials cannot be
    /// resolved and `ConfigError::HttpClient` when the HTTP client fails to
    /// initialize.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let credentials = config.credentials()?;
        let transport = HttpTransport::new().map_err(ConfigError::HttpClient)?;

        Ok(Self::new(credentials, transport)
            .with_api_base(&config.telegram.api_base)
            .with_timeouts(config.message_timeout(), config.file_timeout())
            .with_report(config.report.clone()))
    }
}

impl<T: Transport> Notifier<T> {
    /// Create a notifier with default endpoint, timeouts and report footer
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            message_timeout: MESSAGE_TIMEOUT,
            file_timeout: FILE_TIMEOUT,
            report: ReportConfig::default(),
            transport,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, message_timeout: Duration, file_timeout: Duration) -> Self {
        self.message_timeout = message_timeout;
        self.file_timeout = file_timeout;
        self
    }

    pub fn with_report(mut self, report: ReportConfig) -> Self {
        self.report = report;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Format a Bot API method URL
    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base,
            self.credentials.bot_token(),
            method
        )
    }

    /// Send the daily summary followed by the warning and emergency digests
    ///
    /// The summary goes out silently. Each non-empty warning or emergency
    /// tier then gets its own audible message, so this issues one to three
    /// requests.
    pub fn send_daily_report(&self, alerts: &AlertBatch) {
        self.send_daily_report_at(alerts, Local::now().naive_local());
    }

    /// Same as [`Notifier::send_daily_report`] with an explicit timestamp
    pub fn send_daily_report_at(&self, alerts: &AlertBatch, now: NaiveDateTime) {
        info!(
            "Sending daily report: {} assets, {} warnings, {} emergencies",
            alerts.count(Level::Level1),
            alerts.count(Level::Level2),
            alerts.count(Level::Level3)
        );

        let summary = format_summary(alerts, now, &self.report);
        self.send_message(&summary, true);

        for level in [Level::Level2, Level::Level3] {
            if let Some(digest) = format_digest(alerts, level) {
                self.send_message(&digest, false);
            }
        }
    }

    /// Send a text message, logging the outcome
    pub fn send_message(&self, text: &str, silent: bool) {
        match self.try_send_message(text, silent) {
            Ok(()) => info!("Telegram message sent (silent: {})", silent),
            Err(NotifyError::Rejected { status, body }) => {
                error!("Telegram message rejected ({}): {}", status, body)
            }
            Err(e) => error!("Telegram message error: {}", e),
        }
    }

    /// Send a text message and report the outcome
    ///
    /// # Errors
    ///
    /// * `NotifyError::Rejected` for any status other than 200
    /// * `NotifyError::Http` for transport failures and timeouts
    pub fn try_send_message(&self, text: &str, silent: bool) -> Result<(), NotifyError> {
        let payload = MessagePayload::new(self.credentials.chat_id(), text, silent);
        debug!(
            "POST sendMessage to chat {} ({} bytes, silent: {})",
            self.credentials.chat_id(),
            text.len(),
            silent
        );

        self.transport
            .post_message(
                &self.method_url("sendMessage"),
                &payload,
                self.message_timeout,
            )?
            .into_result()
    }

    /// Upload a file as a document, logging the outcome
    pub fn send_file(&self, path: &Path, caption: &str) {
        match self.try_send_file(path, caption) {
            Ok(()) => info!("File sent: {}", path.display()),
            Err(NotifyError::Rejected { status, body }) => {
                error!("File upload rejected ({}): {}", status, body)
            }
            Err(e) => error!("File upload error: {}", e),
        }
    }

    /// Upload a file as a document and report the outcome
    ///
    /// The file is opened for the duration of the call only.
    ///
    /// # Errors
    ///
    /// * `NotifyError::File` if the file cannot be opened
    /// * `NotifyError::Rejected` for any status other than 200
    /// * `NotifyError::Http` for transport failures and timeouts
    pub fn try_send_file(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let file = File::open(path).map_err(|source| NotifyError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let length = file.metadata()?.len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        debug!(
            "POST sendDocument to chat {} ({}, {} bytes)",
            self.credentials.chat_id(),
            file_name,
            length
        );

        let upload = DocumentUpload {
            chat_id: self.credentials.chat_id().to_string(),
            caption: caption.to_string(),
            file_name,
            file,
            length,
        };

        self.transport
            .post_document(&self.method_url("sendDocument"), upload, self.file_timeout)?
            .into_result()
    }

    /// Report a failure of the monitoring run itself
    pub fn send_error_alert(&self, error_message: &str) {
        self.send_message(&format_error_alert(error_message), false);
    }
}
