//! Shared handler state

use std::collections::HashMap;
use std::sync::Arc;

use ipnet::IpNet;
use postrelay_core::{
    BodyFormat, Relay, SenderMode, SenderRegistry, DEFAULT_MAX_BODY_BYTES, DEFAULT_SENDER,
};

use crate::metrics::RelayMetrics;

/// Sender and rendering chosen for a send endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRoute {
    pub sender: String,
    pub format: BodyFormat,
}

/// Endpoint name -> send route, built once at startup
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, SendRoute>,
}

impl RouteTable {
    /// `send-email[-html]` for single-sender mode, `send-email[-html]-<name>` otherwise
    pub fn new(mode: SenderMode, senders: &SenderRegistry) -> Self {
        let mut table = Self::default();
        match mode {
            SenderMode::Single => {
                table.insert("send-email".to_string(), DEFAULT_SENDER, BodyFormat::Plain);
                table.insert("send-email-html".to_string(), DEFAULT_SENDER, BodyFormat::Html);
            }
            SenderMode::Multi => {
                for name in senders.names() {
                    table.insert(format!("send-email-{}", name), name, BodyFormat::Plain);
                    table.insert(format!("send-email-html-{}", name), name, BodyFormat::Html);
                }
            }
        }
        table
    }

    fn insert(&mut self, endpoint: String, sender: &str, format: BodyFormat) {
        self.routes.insert(
            endpoint,
            SendRoute {
                sender: sender.to_string(),
                format,
            },
        );
    }

    /// Resolve an endpoint (path without the leading slash)
    pub fn resolve(&self, endpoint: &str) -> Option<&SendRoute> {
        self.routes.get(&endpoint.to_lowercase())
    }

    /// Registered endpoints, sorted
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }
}

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub routes: Arc<RouteTable>,
    pub metrics: RelayMetrics,
    pub trusted_proxies: Arc<Vec<IpNet>>,
    /// Largest accepted request body
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        relay: Relay,
        mode: SenderMode,
        metrics: RelayMetrics,
        trusted_proxies: Vec<IpNet>,
    ) -> Self {
        let routes = RouteTable::new(mode, relay.senders());
        Self {
            relay: Arc::new(relay),
            routes: Arc::new(routes),
            metrics,
            trusted_proxies: Arc::new(trusted_proxies),
            body_limit: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postrelay_core::SenderConfig;

    fn registry(names: &[&str]) -> SenderRegistry {
        let mut registry = SenderRegistry::new();
        for name in names {
            registry.insert(
                name,
                SenderConfig {
                    from_address: format!("{}@corp.com", name),
                    account_email: "service@corp.com".to_string(),
                    account_password: "secret".to_string(),
                    provider: "gmail".to_string(),
                },
            );
        }
        registry
    }

    #[test]
    fn test_single_mode_routes() {
        let table = RouteTable::new(SenderMode::Single, &registry(&[DEFAULT_SENDER]));
        assert_eq!(table.endpoints(), vec!["send-email", "send-email-html"]);
        assert_eq!(
            table.resolve("send-email-html"),
            Some(&SendRoute {
                sender: DEFAULT_SENDER.to_string(),
                format: BodyFormat::Html
            })
        );
    }

    #[test]
    fn test_multi_mode_routes() {
        let table = RouteTable::new(SenderMode::Multi, &registry(&["compras", "vendas"]));
        assert_eq!(
            table.endpoints(),
            vec![
                "send-email-compras",
                "send-email-html-compras",
                "send-email-html-vendas",
                "send-email-vendas"
            ]
        );
        let route = table.resolve("Send-Email-Compras").unwrap();
        assert_eq!(route.sender, "compras");
        assert_eq!(route.format, BodyFormat::Plain);
        assert!(table.resolve("send-email").is_none());
        assert!(table.resolve("send-email-rh").is_none());
    }
}
