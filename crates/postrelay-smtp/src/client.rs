//! SMTP client implementation

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{Tls, TlsParameters, TlsVersion},
        Error as LettreSmtpError,
    },
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tracing::{debug, info, warn};

use crate::{RawMessage, SmtpConfig, SmtpError, SmtpResult, TlsFloor};

/// Default connect and command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Login for an SMTP account
#[derive(Clone)]
pub struct AccountCredentials {
    /// Account username (email address)
    pub username: String,
    password: String,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Submits a rendered message to a provider
///
/// The seam between request handling and the network.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        server: &SmtpConfig,
        credentials: &AccountCredentials,
        message: RawMessage,
    ) -> SmtpResult<()>;
}

/// SMTP client for sending emails
pub struct SmtpClient {
    timeout: Duration,
}

impl Default for SmtpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtpClient {
    /// Create a new SMTP client
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the connect/command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a STARTTLS transport for one submission
    fn transport(
        &self,
        server: &SmtpConfig,
        credentials: &AccountCredentials,
    ) -> SmtpResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut tls = TlsParameters::builder(server.host.clone());
        if let Some(floor) = server.min_tls {
            tls = tls.set_min_tls_version(match floor {
                TlsFloor::Tls12 => TlsVersion::Tlsv12,
                TlsFloor::Tls13 => TlsVersion::Tlsv13,
            });
        }
        let tls = tls.build().map_err(|e| SmtpError::TlsError(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server.host)
            .map_err(|e| SmtpError::ConnectionFailed(e.to_string()))?
            .port(server.port)
            .tls(Tls::Required(tls))
            .timeout(Some(self.timeout))
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .build();

        Ok(transport)
    }

    /// Send a rendered message using password authentication
    pub async fn send_raw(
        &self,
        server: &SmtpConfig,
        credentials: &AccountCredentials,
        message: RawMessage,
    ) -> SmtpResult<()> {
        info!(
            "Sending email via {}:{} as {}",
            server.host, server.port, credentials.username
        );

        let transport = self.transport(server, credentials)?;

        let response = transport
            .send_raw(message.envelope(), message.as_bytes())
            .await
            .map_err(classify_error)?;

        debug!("Server accepted {} with {}", message.message_id(), response.code());
        info!("Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpClient {
    async fn deliver(
        &self,
        server: &SmtpConfig,
        credentials: &AccountCredentials,
        message: RawMessage,
    ) -> SmtpResult<()> {
        self.send_raw(server, credentials, message).await
    }
}

/// Map a lettre error to the step of the exchange that failed
fn classify_error(e: LettreSmtpError) -> SmtpError {
    warn!("SMTP exchange failed: {}", e);
    let text = e.to_string();

    if e.is_tls() {
        return SmtpError::TlsError(text);
    }
    match e.status() {
        Some(code) if is_auth_code(&code.to_string()) => SmtpError::AuthenticationFailed(text),
        Some(_) => SmtpError::SendFailed(text),
        None => SmtpError::ConnectionFailed(text),
    }
}

/// 530, 534, 535 and 538 are reported for rejected credentials
fn is_auth_code(code: &str) -> bool {
    matches!(code, "530" | "534" | "535" | "538")
}
