//! Startup configuration from the environment
//!
//! Two layouts are accepted. When `SENDER_NAMES` is set the relay runs in
//! multi-sender mode: every listed name shares the service account and
//! provider and gets its own From address from `SENDER_<NAME>_EMAIL`.
//! Otherwise a single Gmail sender is built from `GMAIL_USERNAME` and
//! `GMAIL_APP_PASSWORD`.

use std::collections::HashMap;
use std::time::Duration;

use ipnet::IpNet;
use postrelay_smtp::{Provider, ProviderDirectory, DEFAULT_MAILER};
use tracing::{info, warn};

use crate::sender::normalize_name;
use crate::{CoreError, CoreResult, SenderConfig, SenderRegistry};

/// Sender name used in single-sender mode
pub const DEFAULT_SENDER: &str = "default";
/// Listen port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 8080;
/// Proxies trusted for `X-Forwarded-For` when `TRUSTED_PROXIES` is unset
pub const DEFAULT_TRUSTED_PROXIES: &str = "192.168.1.0/24";
/// SMTP timeout when `SMTP_TIMEOUT_SECS` is unset
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;
/// Request body cap when `MAX_BODY_BYTES` is unset, sized for provider attachment limits
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// How senders were configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderMode {
    /// One Gmail identity under [`DEFAULT_SENDER`]
    Single,
    /// Named identities from `SENDER_NAMES`
    Multi,
}

/// Process configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: SenderMode,
    pub senders: SenderRegistry,
    pub port: u16,
    pub trusted_proxies: Vec<IpNet>,
    pub mailer_name: String,
    pub smtp_timeout: Duration,
    pub max_body_bytes: usize,
}

impl RelayConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> CoreResult<Self> {
        if let Ok(path) = dotenv::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mode, senders) = match non_empty(&lookup, "SENDER_NAMES") {
            Some(names) => (SenderMode::Multi, multi_sender_registry(&lookup, &names)?),
            None => (SenderMode::Single, single_sender_registry(&lookup)?),
        };

        let port = match non_empty(&lookup, "PORT") {
            Some(port) => port.parse().map_err(|e| CoreError::invalid("PORT", e))?,
            None => DEFAULT_PORT,
        };

        let proxies = non_empty(&lookup, "TRUSTED_PROXIES")
            .unwrap_or_else(|| DEFAULT_TRUSTED_PROXIES.to_string());
        let trusted_proxies = split_list(&proxies)
            .map(|cidr| {
                cidr.parse::<IpNet>()
                    .map_err(|e| CoreError::invalid("TRUSTED_PROXIES", format!("{}: {}", cidr, e)))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let mailer_name =
            non_empty(&lookup, "MAILER_NAME").unwrap_or_else(|| DEFAULT_MAILER.to_string());

        let timeout_secs: u64 = positive(&lookup, "SMTP_TIMEOUT_SECS", DEFAULT_SMTP_TIMEOUT_SECS)?;
        let max_body_bytes: usize = positive(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        Ok(Self {
            mode,
            senders,
            port,
            trusted_proxies,
            mailer_name,
            smtp_timeout: Duration::from_secs(timeout_secs),
            max_body_bytes,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> CoreResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or_else(|| CoreError::MissingVariable(key.to_string()))
}

/// Parse an optional non-zero integer
fn positive<F, T>(lookup: &F, key: &str, default: T) -> CoreResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(default);
    };
    let value: T = raw.parse().map_err(|e| CoreError::invalid(key, e))?;
    if value == T::default() {
        return Err(CoreError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Environment variable holding the From address of `name`
pub fn sender_email_key(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("SENDER_{}_EMAIL", upper)
}

fn validate_sender_name(name: &str) -> CoreResult<()> {
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::invalid(
            "SENDER_NAMES",
            format!("{}: only letters, digits, '-' and '_' are allowed", name),
        ));
    }
    // send-email-html-<name> would be ambiguous
    if name == "html" || name.starts_with("html-") {
        return Err(CoreError::invalid(
            "SENDER_NAMES",
            format!("{}: names may not start with 'html'", name),
        ));
    }
    Ok(())
}

fn multi_sender_registry<F>(lookup: &F, names: &str) -> CoreResult<SenderRegistry>
where
    F: Fn(&str) -> Option<String>,
{
    let account_email = required(lookup, "SERVICE_ACCOUNT_EMAIL")?;
    let account_password = required(lookup, "SERVICE_ACCOUNT_PASS")?;
    let provider = required(lookup, "SENDER_PROVIDER")?;

    if ProviderDirectory::lookup(&provider).is_err() {
        warn!("SENDER_PROVIDER {} is not a known provider; sends will fail", provider);
    }

    let mut registry = SenderRegistry::new();
    let mut keys: HashMap<String, String> = HashMap::new();
    for name in split_list(names) {
        let name = normalize_name(name);
        validate_sender_name(&name)?;
        let key = sender_email_key(&name);
        // rh-sp and rh_sp would share SENDER_RH_SP_EMAIL
        if let Some(other) = keys.get(&key).filter(|other| **other != name) {
            return Err(CoreError::invalid(
                "SENDER_NAMES",
                format!("{} and {} both read {}", other, name, key),
            ));
        }
        let from_address = required(lookup, &key)?;
        keys.insert(key, name.clone());
        info!("Registered sender {} as {}", name, from_address);
        registry.insert(
            &name,
            SenderConfig {
                from_address,
                account_email: account_email.clone(),
                account_password: account_password.clone(),
                provider: provider.clone(),
            },
        );
    }

    if registry.is_empty() {
        return Err(CoreError::MissingVariable("SENDER_NAMES".to_string()));
    }
    Ok(registry)
}

fn single_sender_registry<F>(lookup: &F) -> CoreResult<SenderRegistry>
where
    F: Fn(&str) -> Option<String>,
{
    let username = required(lookup, "GMAIL_USERNAME")?;
    let password = required(lookup, "GMAIL_APP_PASSWORD")?;

    let mut registry = SenderRegistry::new();
    registry.insert(
        DEFAULT_SENDER,
        SenderConfig {
            from_address: username.clone(),
            account_email: username,
            account_password: password,
            provider: Provider::Gmail.as_str().to_string(),
        },
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn multi_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SENDER_NAMES", "compras, Vendas"),
            ("SERVICE_ACCOUNT_EMAIL", "service@corp.com"),
            ("SERVICE_ACCOUNT_PASS", "secret"),
            ("SENDER_PROVIDER", "office365"),
            ("SENDER_COMPRAS_EMAIL", "compras@corp.com"),
            ("SENDER_VENDAS_EMAIL", "vendas@corp.com"),
        ]
    }

    #[test]
    fn test_single_sender_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("GMAIL_USERNAME", "me@gmail.com"),
            ("GMAIL_APP_PASSWORD", "app-pass"),
        ]))
        .unwrap();

        assert_eq!(config.mode, SenderMode::Single);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mailer_name, DEFAULT_MAILER);
        assert_eq!(config.smtp_timeout, Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.trusted_proxies, vec!["192.168.1.0/24".parse::<IpNet>().unwrap()]);

        let sender = config.senders.get(DEFAULT_SENDER).unwrap();
        assert_eq!(sender.from_address, "me@gmail.com");
        assert_eq!(sender.account_email, "me@gmail.com");
        assert_eq!(sender.provider, "gmail");
    }

    #[test]
    fn test_single_sender_missing_password() {
        let err =
            RelayConfig::from_lookup(lookup(&[("GMAIL_USERNAME", "me@gmail.com")])).unwrap_err();
        assert!(matches!(err, CoreError::MissingVariable(ref v) if v == "GMAIL_APP_PASSWORD"));
    }

    #[test]
    fn test_multi_sender_registry() {
        let mut vars = multi_vars();
        vars.push(("PORT", "9090"));
        vars.push(("MAILER_NAME", "TTZ Sistema de Compras"));
        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.mode, SenderMode::Multi);
        assert_eq!(config.port, 9090);
        assert_eq!(config.mailer_name, "TTZ Sistema de Compras");
        assert_eq!(config.senders.names().collect::<Vec<_>>(), vec!["compras", "vendas"]);

        let vendas = config.senders.get("vendas").unwrap();
        assert_eq!(vendas.from_address, "vendas@corp.com");
        assert_eq!(vendas.account_email, "service@corp.com");
        assert_eq!(vendas.provider, "office365");
    }

    #[test]
    fn test_multi_sender_missing_sender_email() {
        let vars: Vec<_> = multi_vars()
            .into_iter()
            .filter(|(k, _)| *k != "SENDER_VENDAS_EMAIL")
            .collect();
        let err = RelayConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, CoreError::MissingVariable(ref v) if v == "SENDER_VENDAS_EMAIL"));
    }

    #[test]
    fn test_multi_sender_missing_account() {
        let vars: Vec<_> = multi_vars()
            .into_iter()
            .filter(|(k, _)| *k != "SERVICE_ACCOUNT_PASS")
            .collect();
        let err = RelayConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err.to_string(), "SERVICE_ACCOUNT_PASS environment variable must be set");
    }

    #[test]
    fn test_unknown_provider_is_accepted_at_startup() {
        let mut vars = multi_vars();
        vars.retain(|(k, _)| *k != "SENDER_PROVIDER");
        vars.push(("SENDER_PROVIDER", "yahoo"));
        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.senders.get("compras").unwrap().smtp_config().is_err());
    }

    #[test]
    fn test_rejects_ambiguous_sender_name() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("SENDER_NAMES", "html-team"),
            ("SERVICE_ACCOUNT_EMAIL", "service@corp.com"),
            ("SERVICE_ACCOUNT_PASS", "secret"),
            ("SENDER_PROVIDER", "gmail"),
            ("SENDER_HTML_TEAM_EMAIL", "team@corp.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidVariable { .. }));
    }

    #[test]
    fn test_invalid_port_and_proxy() {
        let mut vars = multi_vars();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(CoreError::InvalidVariable { ref name, .. }) if name == "PORT"
        ));

        let mut vars = multi_vars();
        vars.push(("TRUSTED_PROXIES", "10.0.0.0/8, nonsense"));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&vars)),
            Err(CoreError::InvalidVariable { ref name, .. }) if name == "TRUSTED_PROXIES"
        ));
    }

    #[test]
    fn test_sender_email_key() {
        assert_eq!(sender_email_key("compras"), "SENDER_COMPRAS_EMAIL");
        assert_eq!(sender_email_key("rh-sp"), "SENDER_RH_SP_EMAIL");
    }

    #[test]
    fn test_zero_timeout_and_body_limit_are_rejected() {
        for key in ["SMTP_TIMEOUT_SECS", "MAX_BODY_BYTES"] {
            let mut vars = multi_vars();
            vars.push((key, "0"));
            let err = RelayConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidVariable { ref name, .. } if name == key),
                "{}: {}",
                key,
                err
            );
        }

        let mut vars = multi_vars();
        vars.push(("SMTP_TIMEOUT_SECS", "5"));
        vars.push(("MAX_BODY_BYTES", "1048576"));
        let config = RelayConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.smtp_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_rejects_names_sharing_an_email_variable() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("SENDER_NAMES", "rh-sp, rh_sp"),
            ("SERVICE_ACCOUNT_EMAIL", "service@corp.com"),
            ("SERVICE_ACCOUNT_PASS", "secret"),
            ("SENDER_PROVIDER", "gmail"),
            ("SENDER_RH_SP_EMAIL", "rh@corp.com"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidVariable { ref name, .. } if name == "SENDER_NAMES"
        ));
        assert!(err.to_string().contains("SENDER_RH_SP_EMAIL"));
    }
}
