/// Bot API transport and the notifier built on it
pub mod notifier;
pub mod transport;

pub use notifier::{Notifier, FILE_TIMEOUT, MESSAGE_TIMEOUT};
pub use transport::{ApiReply, DocumentUpload, HttpTransport, MessagePayload, Transport};
