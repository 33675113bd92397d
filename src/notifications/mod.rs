pub mod sms;

pub use sms::{LogSmsSender, Notifier, SmsSender, TwilioSmsSender, recipient_phone};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("invalid recipient number: {0}")]
    InvalidRecipient(String),
    #[error("sms transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sms provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
