//! Error types for the DNS forwarder.
//!
//! This module defines the error types used throughout the forwarder
//! implementation.

use thiserror::Error;

/// Represents errors that can occur while decoding, resolving or relaying
/// DNS messages.
#[derive(Error, Debug)]
pub enum DnsError {
    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffer ended before a fixed-width field or record was complete.
    #[error("truncated buffer: needed {needed} byte(s) at offset {offset}")]
    TruncatedBuffer { offset: usize, needed: usize },

    /// A domain name with an invalid label length or an unterminated
    /// compression-pointer chain.
    #[error("malformed domain name: {0}")]
    MalformedName(String),

    /// A decoded domain name exceeding 255 octets on the wire.
    #[error("domain name exceeds 255 octets")]
    NameTooLong,

    /// Any nested decode failure while reading a whole message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The upstream resolver could not be reached.
    #[error("upstream resolver unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream resolver did not answer within the receive deadline.
    #[error("upstream resolver timed out")]
    UpstreamTimeout,

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),
}
