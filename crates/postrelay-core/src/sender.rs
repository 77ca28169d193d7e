//! Sender identities

use std::collections::HashMap;

use postrelay_smtp::{AccountCredentials, ProviderDirectory, SmtpConfig};

use crate::{CoreError, CoreResult};

/// Outbound identity a sender name maps to
#[derive(Clone)]
pub struct SenderConfig {
    /// Address shown in the From header
    pub from_address: String,
    /// Account used for SMTP authentication and the envelope sender
    pub account_email: String,
    /// Account password (app password for Gmail)
    pub account_password: String,
    /// Provider identifier, resolved when sending
    pub provider: String,
}

impl SenderConfig {
    /// Credentials for SMTP AUTH
    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials::new(self.account_email.clone(), self.account_password.clone())
    }

    /// Resolve the provider to its submission endpoint
    pub fn smtp_config(&self) -> CoreResult<SmtpConfig> {
        Ok(ProviderDirectory::lookup(&self.provider)?)
    }
}

impl std::fmt::Debug for SenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderConfig")
            .field("from_address", &self.from_address)
            .field("account_email", &self.account_email)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Immutable table of sender name -> configuration
#[derive(Debug, Clone, Default)]
pub struct SenderRegistry {
    order: Vec<String>,
    senders: HashMap<String, SenderConfig>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sender; names are case-insensitive and a later entry replaces an earlier one
    pub fn insert(&mut self, name: &str, config: SenderConfig) {
        let name = normalize_name(name);
        if self.senders.insert(name.clone(), config).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a sender by name
    pub fn get(&self, name: &str) -> CoreResult<&SenderConfig> {
        self.senders
            .get(&normalize_name(name))
            .ok_or_else(|| CoreError::SenderNotConfigured(name.to_string()))
    }

    /// Registered names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
