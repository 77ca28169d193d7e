//! Outgoing message model

use std::time::{SystemTime, UNIX_EPOCH};

use lettre::address::{Address, Envelope};
use rand::Rng;

use crate::{OutgoingAttachment, SmtpError, SmtpResult};

/// Default `X-Mailer` header value
pub const DEFAULT_MAILER: &str = "postrelay";

/// Email message to send
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Authenticated account; envelope sender and Return-Path
    pub account: String,
    /// From header address
    pub from: String,
    /// Recipient
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Body, plain text or HTML depending on the builder used
    pub body: String,
    /// X-Mailer header
    pub mailer: String,
    /// Optional file attachment
    pub attachment: Option<OutgoingAttachment>,
}

impl OutgoingMessage {
    /// Create a new message sent by `account`, shown as coming from `from`
    pub fn new(account: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            from: from.into(),
            to: String::new(),
            subject: String::new(),
            body: String::new(),
            mailer: DEFAULT_MAILER.to_string(),
            attachment: None,
        }
    }

    /// Set the recipient
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to = address.into();
        self
    }

    /// Set the subject line
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the X-Mailer header
    pub fn mailer(mut self, mailer: impl Into<String>) -> Self {
        self.mailer = mailer.into();
        self
    }

    /// Attach a decoded file
    pub fn attachment(mut self, attachment: Option<OutgoingAttachment>) -> Self {
        self.attachment = attachment;
        self
    }

    /// SMTP envelope: MAIL FROM the account, RCPT TO the recipient
    pub fn envelope(&self) -> SmtpResult<Envelope> {
        let from = parse_address(&self.account)?;
        let to = parse_address(&self.to)?;
        Envelope::new(Some(from), vec![to]).map_err(|e| SmtpError::InvalidAddress(e.to_string()))
    }
}

/// A fully rendered message and the envelope it is submitted with
#[derive(Debug, Clone)]
pub struct RawMessage {
    envelope: Envelope,
    message_id: String,
    bytes: Vec<u8>,
}

impl RawMessage {
    pub(crate) fn new(envelope: Envelope, message_id: String, bytes: Vec<u8>) -> Self {
        Self {
            envelope,
            message_id,
            bytes,
        }
    }

    /// Envelope used for MAIL FROM / RCPT TO
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Message-ID header value, angle brackets included
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Wire bytes streamed after DATA
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub(crate) fn parse_address(address: &str) -> SmtpResult<Address> {
    address
        .trim()
        .parse()
        .map_err(|e| SmtpError::InvalidAddress(format!("{}: {}", address, e)))
}

/// Generate a Message-ID of the form `<nanos.random@host>`
pub fn generate_message_id(host: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let suffix: i64 = rand::thread_rng().gen_range(0..i64::MAX);
    format!("<{}.{}@{}>", nanos, suffix, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_uses_account_and_recipient() {
        let msg = OutgoingMessage::new("service@corp.com", "compras@corp.com").to("a@b.com");
        let envelope = msg.envelope().unwrap();
        assert_eq!(envelope.from().map(|a| a.to_string()), Some("service@corp.com".to_string()));
        let to: Vec<String> = envelope.to().iter().map(|a| a.to_string()).collect();
        assert_eq!(to, vec!["a@b.com".to_string()]);
    }

    #[test]
    fn test_envelope_rejects_bad_recipient() {
        let msg = OutgoingMessage::new("service@corp.com", "service@corp.com").to("not-an-address");
        assert!(matches!(msg.envelope(), Err(SmtpError::InvalidAddress(_))));
    }

    #[test]
    fn test_message_id_format() {
        let id = generate_message_id("smtp.gmail.com");
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@smtp.gmail.com>"));
        let local = &id[1..id.find('@').unwrap()];
        let (nanos, suffix) = local.split_once('.').unwrap();
        assert!(nanos.parse::<u128>().is_ok());
        assert!(suffix.parse::<i64>().is_ok());
        assert_ne!(id, generate_message_id("smtp.gmail.com"));
    }
}
