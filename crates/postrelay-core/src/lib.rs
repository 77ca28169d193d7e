//! Core logic for postrelay
//!
//! Provides the sender registry, startup configuration, and the relay
//! service that turns requests into delivered messages.

mod config;
mod error;
mod relay;
mod sender;

pub use config::{
    sender_email_key, RelayConfig, SenderMode, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, DEFAULT_SENDER,
    DEFAULT_SMTP_TIMEOUT_SECS, DEFAULT_TRUSTED_PROXIES,
};
pub use error::{CoreError, CoreResult};
pub use relay::{BodyFormat, EmailRequest, Relay};
pub use sender::{SenderConfig, SenderRegistry};
