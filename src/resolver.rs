//! Query resolution.
//!
//! The [`Resolver`] drives each query through
//! `Received -> {LocalAnswer | Forwarded} -> Responded`: answer from the
//! cache when possible, otherwise relay to the upstream resolver and fold
//! its reply into the cache and the response.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::UdpSocket;

use crate::cache::DnsCache;
use crate::errors::DnsError;
use crate::message::{opcode, rcode, Message, Question};
use crate::records::rtype;
use crate::wire;

/// The upstream relay collaborator.
///
/// Given an encoded query, produces the decoded reply message or a
/// transport error. Implementations own their sockets and deadlines.
pub trait Upstream {
    fn relay(&self, query: &[u8]) -> impl Future<Output = Result<Message, DnsError>> + Send;
}

/// UDP client relaying queries to a configured upstream resolver.
#[derive(Debug, Clone)]
pub struct UdpUpstream {
    addr: SocketAddr,
    timeout: Duration,
    max_packet_size: usize,
}

impl UdpUpstream {
    /// Create a relay client for the given resolver address.
    ///
    /// # Arguments
    /// * `addr` - The upstream resolver to forward to.
    /// * `timeout` - Receive deadline; expiry abandons the in-flight relay.
    /// * `max_packet_size` - Receive buffer size for the reply datagram.
    pub fn new(addr: SocketAddr, timeout: Duration, max_packet_size: usize) -> Self {
        Self {
            addr,
            timeout,
            max_packet_size,
        }
    }
}

impl Upstream for UdpUpstream {
    fn relay(&self, query: &[u8]) -> impl Future<Output = Result<Message, DnsError>> + Send {
        async move {
            let socket = UdpSocket::bind("0.0.0.0:0")
                .await
                .map_err(|e| DnsError::UpstreamUnavailable(e.to_string()))?;
            socket
                .send_to(query, self.addr)
                .await
                .map_err(|e| DnsError::UpstreamUnavailable(e.to_string()))?;

            let mut buf = vec![0u8; self.max_packet_size];
            let (size, _) = tokio::time::timeout(self.timeout, socket.recv_from(&mut buf))
                .await
                .map_err(|_| DnsError::UpstreamTimeout)?
                .map_err(|e| DnsError::UpstreamUnavailable(e.to_string()))?;

            wire::read_message(&buf[..size])
        }
    }
}

/// Per-request orchestrator over the cache and the upstream relay.
///
/// Owned once at startup and cloned into handler tasks; the cache is
/// shared behind its own lock, no global state.
#[derive(Debug, Clone)]
pub struct Resolver<U> {
    cache: DnsCache,
    upstream: U,
    cache_enabled: bool,
}

impl<U: Upstream> Resolver<U> {
    /// Create a resolver over an existing cache and relay collaborator.
    pub fn new(cache: DnsCache, upstream: U, cache_enabled: bool) -> Self {
        Self {
            cache,
            upstream,
            cache_enabled,
        }
    }

    /// Process one raw query datagram into a raw response datagram.
    ///
    /// A query that fails to decode yields `MalformedMessage`; no partial
    /// response is ever emitted for it.
    pub async fn handle_query(&self, buf: &[u8]) -> Result<Vec<u8>, DnsError> {
        let query = wire::read_message(buf)?;
        let response = self.resolve(query).await;
        Ok(wire::encode_message(&response))
    }

    /// Resolve a decoded query into its response message.
    pub async fn resolve(&self, mut msg: Message) -> Message {
        debug!("received {}", msg);

        if msg.opcode() != opcode::QUERY {
            info!("opcode {} not implemented", msg.opcode());
            msg.set_rcode(rcode::NOT_IMPLEMENTED);
            msg.set_response();
            return msg;
        }

        // The wire format allows several questions per message, but like
        // nearly every deployed resolver we answer only the first.
        if let Some(question) = msg.questions.first().cloned() {
            if question.qtype == rtype::A || question.qtype == rtype::CNAME {
                self.answer_question(&mut msg, &question).await;
            }
        }

        msg.set_response();
        msg
    }

    async fn answer_question(&self, msg: &mut Message, question: &Question) {
        if self.cache_enabled {
            if let Some(records) = self.cache.get(question) {
                debug!("cache hit for {}", question.name);
                for record in records {
                    msg.add_answer(record);
                }
                return;
            }
        }

        debug!("cache miss for {}, forwarding upstream", question.name);
        let query_wire = wire::encode_message(msg);
        match self.upstream.relay(&query_wire).await {
            Ok(reply) => {
                if reply.rcode() == rcode::OK {
                    // The cache and the response each get their own copy;
                    // their lifetimes are fully independent.
                    if self.cache_enabled {
                        self.cache.set(question.clone(), reply.answers.clone());
                    }
                    for record in reply.answers {
                        msg.add_answer(record);
                    }
                } else {
                    info!(
                        "upstream answered {} with rcode {}",
                        question.name,
                        reply.rcode()
                    );
                    msg.set_rcode(reply.rcode());
                }
            }
            Err(e) => {
                warn!("upstream relay failed for {}: {}", question.name, e);
                msg.set_rcode(rcode::SERVER_FAILURE);
            }
        }
    }
}
