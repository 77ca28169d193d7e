//! Relay service: request -> message -> transport

use std::sync::Arc;

use postrelay_smtp::{
    build_html, build_multipart, MailTransport, OutgoingAttachment, OutgoingMessage, RawMessage,
    SmtpConfig, DEFAULT_MAILER,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{CoreError, CoreResult, SenderConfig, SenderRegistry};

/// JSON payload accepted by the send endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub filename: Option<String>,
    /// Base64 file contents
    #[serde(default)]
    pub attachment: Option<String>,
}

impl EmailRequest {
    /// Mandatory fields must be non-empty
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [("to", &self.to), ("subject", &self.subject), ("body", &self.body)] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidRequest(format!(
                    "missing required field `{}`",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// How the request body is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// Hand-built multipart/mixed with a text/plain part
    Plain,
    /// lettre-built text/html message
    Html,
}

/// Sends requests on behalf of the configured senders
pub struct Relay {
    senders: SenderRegistry,
    transport: Arc<dyn MailTransport>,
    mailer_name: String,
}

impl Relay {
    pub fn new(senders: SenderRegistry, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            senders,
            transport,
            mailer_name: DEFAULT_MAILER.to_string(),
        }
    }

    /// Set the X-Mailer header value
    pub fn with_mailer_name(mut self, name: impl Into<String>) -> Self {
        self.mailer_name = name.into();
        self
    }

    pub fn senders(&self) -> &SenderRegistry {
        &self.senders
    }

    /// Render a request as `sender` would send it through `server`
    pub fn compose(
        &self,
        sender: &SenderConfig,
        server: &SmtpConfig,
        format: BodyFormat,
        request: &EmailRequest,
    ) -> CoreResult<RawMessage> {
        let attachment = OutgoingAttachment::from_request(
            request.filename.as_deref(),
            request.attachment.as_deref(),
        )?;

        let message = OutgoingMessage::new(&sender.account_email, &sender.from_address)
            .to(request.to.trim())
            .subject(&request.subject)
            .body(&request.body)
            .mailer(&self.mailer_name)
            .attachment(attachment);

        let raw = match format {
            BodyFormat::Plain => build_multipart(&message, &server.host)?,
            BodyFormat::Html => build_html(&message, &server.host)?,
        };
        Ok(raw)
    }

    /// Validate, render and deliver one request
    ///
    /// Validation, sender and provider lookup, and rendering all happen
    /// before the transport is touched.
    pub async fn send(
        &self,
        sender_name: &str,
        format: BodyFormat,
        request: &EmailRequest,
    ) -> CoreResult<()> {
        request.validate()?;
        let sender = self.senders.get(sender_name)?;
        let server = sender.smtp_config()?;
        let message = self.compose(sender, &server, format, request)?;

        info!(
            "Relaying {:?} email from {} to {}",
            format, sender_name, request.to
        );
        debug!("Message-ID {}", message.message_id());

        self.transport
            .deliver(&server, &sender.credentials(), message)
            .await?;
        Ok(())
    }
}
