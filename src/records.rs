//! Resource-record model.
//!
//! Each record type encapsulates its own wire-payload shape behind the
//! [`RecordData`] enum; everything outside this module handles records
//! uniformly and only the encode/decode dispatch here branches on type.

use std::fmt;
use std::net::Ipv4Addr;

use crate::errors::DnsError;
use crate::wire::{self, Cursor};

/// Well-known record type codes.
pub mod rtype {
    pub const A: u16 = 1;
    pub const NS: u16 = 2;
    pub const CNAME: u16 = 5;
    pub const SOA: u16 = 6;
    pub const PTR: u16 = 12;
    pub const MX: u16 = 15;
    pub const TXT: u16 = 16;
    pub const AAAA: u16 = 28;
    pub const SRV: u16 = 33;
}

/// The IN (internet) record class.
pub const CLASS_IN: u16 = 1;

/// Type-specific record payload.
///
/// A closed set of variants; adding a record type means adding one arm
/// here plus its codec below. Unrecognized types are retained opaquely so
/// a single unknown record never fails a whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// IPv4 host address.
    A(Ipv4Addr),
    /// Canonical-name alias target.
    Cname(String),
    /// Payload of an unrecognized record type, kept verbatim.
    Raw(Vec<u8>),
}

impl RecordData {
    /// Decode a payload of `rdlength` bytes for record type `rtype`.
    pub fn decode(rtype: u16, cur: &mut Cursor, rdlength: u16) -> Result<Self, DnsError> {
        match rtype {
            rtype::A => {
                if rdlength != 4 {
                    return Err(DnsError::MalformedMessage(format!(
                        "A record with rdata length {}",
                        rdlength
                    )));
                }
                let octets = cur.read_bytes(4)?;
                Ok(Self::A(Ipv4Addr::new(
                    octets[0], octets[1], octets[2], octets[3],
                )))
            }
            // The target name may itself be compressed.
            rtype::CNAME => Ok(Self::Cname(cur.read_name()?)),
            _ => Ok(Self::Raw(cur.read_bytes(rdlength as usize)?.to_vec())),
        }
    }

    /// Encode the rdata length followed by the payload.
    ///
    /// The length is computed from the payload being written, matching
    /// what the decoder expects to consume.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::A(addr) => {
                wire::write_u16(out, 4);
                out.extend_from_slice(&addr.octets());
            }
            Self::Cname(target) => {
                let mut name = Vec::new();
                wire::write_name(&mut name, target);
                wire::write_u16(out, name.len() as u16);
                out.extend_from_slice(&name);
            }
            Self::Raw(bytes) => {
                wire::write_u16(out, bytes.len() as u16);
                out.extend_from_slice(bytes);
            }
        }
    }

    /// Human-readable rendering of the payload.
    pub fn describe(&self) -> String {
        match self {
            Self::A(addr) => format!("A {}", addr),
            Self::Cname(target) => format!("CNAME {}", target),
            Self::Raw(bytes) => format!("RAW {} byte(s)", bytes.len()),
        }
    }
}

/// One DNS answer: common metadata plus a type-specific payload.
///
/// `Clone` is the deep copy used when an upstream answer must live
/// independently in the cache and in an outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name({}) Type({}) Class({}) TTL({}) {}",
            self.name,
            self.rtype,
            self.rclass,
            self.ttl,
            self.data.describe()
        )
    }
}
