/// Alert batch model and message formatting
pub mod batch;
pub mod report;

pub use batch::{AlertBatch, Level};
pub use report::{format_digest, format_error_alert, format_summary, DIGEST_LIMIT};
