//! Action errors.

use bridge_client::BridgeError;
use thiserror::Error;

/// Input problems caught before anything reaches the bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipient is required")]
    MissingRecipient,

    #[error("Phone number must be in international format (it must not start with 0)")]
    LocalPhoneFormat,

    #[error("'{0}' is not a recognised WhatsApp address")]
    UnknownDomain(String),

    #[error("This action cannot be sent to {0}")]
    UnsupportedRecipient(&'static str),

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid duration {0}. Use 0 for no expiry, or between 24 hours (86400s) and 90 days (7776000s)")]
    InvalidDuration(u32),

    #[error("A poll needs at least {min} options")]
    TooFewOptions { min: usize },

    #[error("Max answers must be between 1 and {options}, got {value}")]
    MaxAnswerOutOfRange { value: u32, options: usize },

    #[error("Attach a file or provide a URL")]
    MissingAttachment,

    #[error("Unsupported {kind} type '{mime}', use {allowed}")]
    UnsupportedMedia {
        kind: &'static str,
        mime: String,
        allowed: String,
    },

    #[error("{field} must be a valid http(s) URL")]
    InvalidUrl { field: &'static str },

    #[error("File is {size} bytes, the limit is {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Unknown device '{0}'")]
    UnknownDevice(String),
}

/// Failure of an action outside form validation.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}
