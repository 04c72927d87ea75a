//! Caching DNS Forwarder Library
//!
//! This library provides a caching DNS forwarding resolver: it decodes
//! DNS messages from raw bytes, answers queries from a local record cache
//! seeded by a hosts file, and otherwise relays queries to an upstream
//! resolver and folds the reply back into its cache and response.

// Define modules
pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod hosts;
pub mod message;
pub mod records;
pub mod resolver;
pub mod wire;

// Re-export commonly used items
pub use cache::DnsCache;
pub use config::ServerConfig;
pub use errors::DnsError;
pub use message::{Message, Question};
pub use records::{RecordData, ResourceRecord};
pub use resolver::{Resolver, UdpUpstream, Upstream};
