//! Caching DNS Forwarder
//!
//! Answers A and CNAME queries from a hosts-seeded cache and relays
//! everything else to an upstream resolver.

use log::{info, warn};
use tokio::signal;

use dns_forwarder::{
    cache::DnsCache,
    config::ServerConfig,
    errors::DnsError,
    handlers::run_udp_server,
    hosts,
    resolver::{Resolver, UdpUpstream},
};

#[tokio::main]
async fn main() -> Result<(), DnsError> {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    // Load configuration from environment variables
    let config = ServerConfig::from_env()?;

    // Seed the cache from the hosts file; a missing file is not fatal
    let cache = DnsCache::new();
    match hosts::read_pairs(&config.hosts_path) {
        Ok(pairs) => {
            let seeded = cache.load(pairs);
            info!("Seeded {} cache entries from {}", seeded, config.hosts_path);
        }
        Err(e) => warn!("Failed to read hosts file {}: {}", config.hosts_path, e),
    }

    let upstream = UdpUpstream::new(
        config.upstream,
        config.upstream_timeout,
        config.max_packet_size,
    );
    let resolver = Resolver::new(cache, upstream, config.cache_enabled);
    info!(
        "Forwarding cache misses to {} (cache {})",
        config.upstream,
        if config.cache_enabled { "enabled" } else { "disabled" }
    );

    let server = run_udp_server(config, resolver);

    // Wait for either a shutdown signal or a server error
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
        res = server => res,
    }
}
