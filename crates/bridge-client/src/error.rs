//! Bridge client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bridge answered with its structured error envelope.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The bridge answered with an error status but no readable envelope.
    #[error("Unexpected response status: {0}")]
    Status(u16),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid multipart part '{name}': {reason}")]
    InvalidPart { name: String, reason: String },
}

impl BridgeError {
    /// Server-provided message, when the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BridgeError::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
