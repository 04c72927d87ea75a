//! In-memory record cache.
//!
//! Maps a [`Question`] to the records that answer it, consulted before any
//! upstream relay. Lookup is an exact structural match on name, type and
//! class; no suffix or wildcard matching. Staleness is checked lazily at
//! lookup time against the records' TTLs; there is no background eviction.

use std::{
    collections::HashMap,
    net::Ipv4Addr,
    sync::{Arc, Mutex},
    time::Instant,
};

use log::{debug, warn};

use crate::message::Question;
use crate::records::{rtype, RecordData, ResourceRecord, CLASS_IN};

/// TTL given to entries seeded from a hosts file, in seconds.
pub const SEED_TTL: u32 = 86_400;

/// One cached answer set and the moment it was inserted.
#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<ResourceRecord>,
    inserted: Instant,
}

impl CacheEntry {
    /// An entry stays fresh until its age exceeds the smallest TTL among
    /// its records.
    fn is_fresh(&self, now: Instant) -> bool {
        let min_ttl = self.records.iter().map(|r| r.ttl).min().unwrap_or(0);
        now.duration_since(self.inserted).as_secs() <= min_ttl as u64
    }
}

/// Cache of resolved answers, shared across request handler tasks.
///
/// The map is guarded by a mutex so a concurrent `set` can never be
/// observed half-inserted by a `get`.
#[derive(Debug, Clone, Default)]
pub struct DnsCache {
    entries: Arc<Mutex<HashMap<Question, CacheEntry>>>,
}

impl DnsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached records for a question.
    ///
    /// Returns copies of the records, or `None` on a miss. A stale entry
    /// is dropped and reported as a miss.
    pub fn get(&self, question: &Question) -> Option<Vec<ResourceRecord>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(question) {
            Some(entry) if entry.is_fresh(Instant::now()) => Some(entry.records.clone()),
            Some(_) => {
                debug!("evicting stale cache entry for {}", question.name);
                entries.remove(question);
                None
            }
            None => None,
        }
    }

    /// Store records for a question, replacing any existing entry.
    pub fn set(&self, question: Question, records: Vec<ResourceRecord>) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            question,
            CacheEntry {
                records,
                inserted: Instant::now(),
            },
        );
    }

    /// Seed A-record entries from `(ipv4 string, domain name)` pairs.
    ///
    /// Pairs with an unparseable address are skipped with a warning.
    /// Comment filtering is the hosts collaborator's job, not the cache's.
    ///
    /// # Returns
    /// The number of entries seeded.
    pub fn load<I>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut seeded = 0;
        for (ip, name) in pairs {
            let addr: Ipv4Addr = match ip.parse() {
                Ok(addr) => addr,
                Err(_) => {
                    warn!("skipping hosts entry with unparseable address: {}", ip);
                    continue;
                }
            };
            let question = Question {
                name: name.clone(),
                qtype: rtype::A,
                qclass: CLASS_IN,
            };
            let record = ResourceRecord {
                name,
                rtype: rtype::A,
                rclass: CLASS_IN,
                ttl: SEED_TTL,
                data: RecordData::A(addr),
            };
            self.set(question, vec![record]);
            seeded += 1;
        }
        seeded
    }

    /// Number of live entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
