//! Message building and SMTP submission for postrelay
//!
//! Renders relay requests either as a hand-built multipart/mixed message or
//! as an HTML message through lettre, and submits them over STARTTLS to
//! Gmail or Office365.

mod attachment;
mod client;
mod error;
mod html;
mod message;
mod mime;
mod provider;

pub use attachment::{
    attachment_content_type, OutgoingAttachment, BINARY_CONTENT_TYPE, PDF_CONTENT_TYPE,
};
pub use client::{AccountCredentials, MailTransport, SmtpClient, DEFAULT_TIMEOUT};
pub use error::{SmtpError, SmtpResult};
pub use html::{build_html, build_html_message};
pub use message::{generate_message_id, OutgoingMessage, RawMessage, DEFAULT_MAILER};
pub use mime::{build_multipart, expand_line_breaks, generate_boundary};
pub use provider::{Provider, ProviderDirectory, SmtpConfig, TlsFloor};
