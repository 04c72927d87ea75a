//! Request handlers for the DNS forwarder.
//!
//! The UDP socket loop collaborator: receives raw datagrams, hands them
//! to the resolver core, and sends the encoded responses back. The core
//! never opens the listening socket itself.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::{net::UdpSocket, task};

use crate::config::ServerConfig;
use crate::errors::DnsError;
use crate::resolver::{Resolver, Upstream};

/// Run the UDP serve loop.
///
/// Each datagram is handled start-to-finish in its own task; the resolver
/// is cloned per request, sharing the cache behind its lock.
pub async fn run_udp_server<U>(config: ServerConfig, resolver: Resolver<U>) -> Result<(), DnsError>
where
    U: Upstream + Clone + Send + Sync + 'static,
{
    let socket = UdpSocket::bind(config.bind_addr).await?;
    info!("UDP DNS forwarder listening on {}", config.bind_addr);
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; config.max_packet_size];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((amt, src)) => {
                let query = buf[..amt].to_vec();
                let socket = socket.clone();
                let resolver = resolver.clone();
                task::spawn(async move {
                    if let Err(e) = handle_udp_query(&query, src, socket, resolver).await {
                        // Malformed queries are dropped, never answered
                        // with a partial response.
                        warn!("query from {} dropped: {}", src, e);
                    }
                });
            }
            Err(e) => error!("UDP receive error: {}", e),
        }
    }
}

async fn handle_udp_query<U: Upstream>(
    query: &[u8],
    src: SocketAddr,
    socket: Arc<UdpSocket>,
    resolver: Resolver<U>,
) -> Result<(), DnsError> {
    debug!("{} byte query from {}", query.len(), src);
    let response = resolver.handle_query(query).await?;
    socket.send_to(&response, src).await?;
    Ok(())
}
