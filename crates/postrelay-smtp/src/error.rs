//! Error types for message building and SMTP submission

use thiserror::Error;

/// Result type for SMTP operations
pub type SmtpResult<T> = Result<T, SmtpError>;

/// Errors that can occur while building or submitting a message
#[derive(Debug, Error)]
pub enum SmtpError {
    /// Provider identifier is not in the directory
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Attachment payload is not valid base64
    #[error("failed to decode base64 attachment: {0}")]
    AttachmentDecode(#[from] base64::DecodeError),

    /// Invalid email address
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Message building error
    #[error("failed to build message: {0}")]
    MessageBuildError(String),

    /// Dial, client setup or I/O failure
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS parameters or STARTTLS handshake failed
    #[error("TLS handshake failed: {0}")]
    TlsError(String),

    /// Server rejected the credentials
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Server rejected the sender, a recipient or the message data
    #[error("failed to send email: {0}")]
    SendFailed(String),
}
