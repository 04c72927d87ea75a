//! Configuration for the DNS forwarder.
//!
//! This module defines the configuration structure and methods to load
//! configuration from environment variables.

use std::{
    env,
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use crate::errors::DnsError;

/// Default upstream resolver when none is configured.
pub const DEFAULT_UPSTREAM: &str = "8.8.8.8";

/// Default hosts file used to seed the cache.
pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";

/// Maximum size of DNS packets in bytes.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Default upstream receive deadline in milliseconds.
pub const UPSTREAM_TIMEOUT_MS: u64 = 5000;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the DNS server to.
    pub bind_addr: SocketAddr,

    /// Upstream resolver queries are relayed to on a cache miss.
    pub upstream: SocketAddr,

    /// Path of the hosts file used to seed the cache.
    pub hosts_path: String,

    /// Whether cache lookups and inserts are enabled.
    pub cache_enabled: bool,

    /// Receive deadline for one upstream relay round trip.
    pub upstream_timeout: Duration,

    /// Maximum size of DNS packets.
    pub max_packet_size: usize,
}

/// Parse an upstream resolver address, defaulting the port to 53 when
/// only an IP is given.
pub fn parse_upstream(value: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| DnsError::Config(format!("invalid upstream address: {}", value)))
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    ///
    /// # Returns
    /// A `Result` containing either the loaded `ServerConfig` or a `DnsError`.
    pub fn from_env() -> Result<Self, DnsError> {
        let bind_addr = env::var("DNS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:1053".into())
            .parse()
            .map_err(|_| DnsError::Config("invalid DNS_BIND address".into()))?;

        let upstream =
            parse_upstream(&env::var("DNS_UPSTREAM").unwrap_or_else(|_| DEFAULT_UPSTREAM.into()))?;

        Ok(Self {
            bind_addr,
            upstream,
            hosts_path: env::var("DNS_HOSTS_FILE").unwrap_or_else(|_| DEFAULT_HOSTS_FILE.into()),
            cache_enabled: !env::var("DNS_NOCACHE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            upstream_timeout: Duration::from_millis(
                env::var("DNS_UPSTREAM_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(UPSTREAM_TIMEOUT_MS),
            ),
            max_packet_size: env::var("DNS_MAX_PACKET_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_PACKET_SIZE),
        })
    }
}
