//! Application error types.

use recipient_actions::{ActionError, ErrorRemapTable, ValidationError};
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_client::BridgeError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed command line.
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    /// One line for the error banner.
    pub fn user_message(&self) -> String {
        let remap = ErrorRemapTable::default();
        match self {
            AppError::Bridge(err) => remap.normalize(err),
            AppError::Action(ActionError::Bridge(err)) => remap.normalize(err),
            other => other.to_string(),
        }
    }
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
