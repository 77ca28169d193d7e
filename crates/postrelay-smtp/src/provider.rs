//! Provider directory
//!
//! Static lookup from a provider identifier to its submission endpoint.

use std::fmt;
use std::str::FromStr;

use crate::{SmtpError, SmtpResult};

/// Lowest TLS version a provider accepts during STARTTLS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsFloor {
    Tls12,
    Tls13,
}

/// Submission endpoint of a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// SMTP host, also used as the TLS server name
    pub host: String,
    /// Submission port (STARTTLS)
    pub port: u16,
    /// Minimum TLS version, if the provider pins one
    pub min_tls: Option<TlsFloor>,
}

impl SmtpConfig {
    /// Create a config without a TLS floor
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            min_tls: None,
        }
    }

    /// Pin the minimum TLS version
    pub fn with_min_tls(mut self, floor: TlsFloor) -> Self {
        self.min_tls = Some(floor);
        self
    }
}

/// Supported SMTP providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gmail,
    Office365,
}

impl Provider {
    /// Identifier used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gmail => "gmail",
            Provider::Office365 => "office365",
        }
    }

    /// Submission endpoint for this provider
    pub fn smtp_config(&self) -> SmtpConfig {
        match self {
            Provider::Gmail => SmtpConfig::new("smtp.gmail.com", 587),
            Provider::Office365 => {
                SmtpConfig::new("smtp.office365.com", 587).with_min_tls(TlsFloor::Tls12)
            }
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = SmtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Ok(Provider::Gmail),
            "office365" => Ok(Provider::Office365),
            _ => Err(SmtpError::UnknownProvider(s.to_string())),
        }
    }
}

/// Resolves provider identifiers to submission endpoints
pub struct ProviderDirectory;

impl ProviderDirectory {
    /// Look up the endpoint for a provider identifier
    pub fn lookup(name: &str) -> SmtpResult<SmtpConfig> {
        name.parse::<Provider>().map(|p| p.smtp_config())
    }
}
