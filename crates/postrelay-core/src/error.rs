//! Error types for the core module

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// A mandatory environment variable is absent or empty
    #[error("{0} environment variable must be set")]
    MissingVariable(String),

    /// An environment variable could not be parsed
    #[error("invalid value for {name}: {reason}")]
    InvalidVariable { name: String, reason: String },

    /// No sender registered under this name
    #[error("sender not configured: {0}")]
    SenderNotConfigured(String),

    /// Request failed validation
    #[error("{0}")]
    InvalidRequest(String),

    /// Message building or SMTP error
    #[error(transparent)]
    Smtp(#[from] postrelay_smtp::SmtpError),
}

impl CoreError {
    pub(crate) fn invalid(name: &str, reason: impl ToString) -> Self {
        CoreError::InvalidVariable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
