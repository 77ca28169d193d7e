//! Pod and caller address diagnostics

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use ipnet::IpNet;
use serde::Serialize;
use tracing::debug;

/// Body of `GET /get-ip`
#[derive(Debug, Serialize)]
pub struct IpInfo {
    pub hostname: String,
    pub ips: Vec<String>,
    pub client_ip: Option<String>,
}

/// Hostname of the pod, `unknown` if it cannot be read
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Addresses the hostname resolves to, deduplicated
pub async fn resolve_host(hostname: &str) -> Vec<String> {
    match tokio::net::lookup_host((hostname, 0)).await {
        Ok(addrs) => {
            let mut ips: Vec<String> = addrs.map(|a| a.ip().to_string()).collect();
            ips.sort();
            ips.dedup();
            ips
        }
        Err(e) => {
            debug!("Could not resolve {}: {}", hostname, e);
            Vec::new()
        }
    }
}

/// Caller address
///
/// The first `X-Forwarded-For` hop is used only when the direct peer is a
/// trusted proxy.
pub fn client_ip(
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    trusted: &[IpNet],
) -> Option<IpAddr> {
    let peer_ip = peer.map(|p| p.ip());
    let peer_trusted = peer_ip.is_some_and(|ip| trusted.iter().any(|net| net.contains(&ip)));

    if peer_trusted {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }
    peer_ip
}
