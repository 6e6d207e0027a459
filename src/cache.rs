//! Message Payload Cache
//!
//! Remembers the raw bytes of cacheable messages by content hash so the server
//! can send a short reference instead of repeating a payload. Entries age by
//! completed runs and are evicted once unused for too many of them.

use crate::error::CacheError;
use crate::protocol::ForwardMsg;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

pub mod fetcher;

pub use fetcher::{HttpPayloadFetcher, PayloadFetcher};

/// A cached payload and the run generation that last used it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub last_touched_generation: u64,
}

#[derive(Debug, Default)]
pub struct PayloadCache {
    entries: HashMap<String, CacheEntry>,
    generation: u64,
}

impl PayloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn entry(&self, hash: &str) -> Option<&CacheEntry> {
        self.entries.get(hash)
    }

    /// Remember `raw` under the message's hash if the sender marked it cacheable.
    ///
    /// References are never cached. A message that is already cached only has
    /// its generation refreshed.
    pub fn maybe_cache_message(&mut self, msg: &ForwardMsg, raw: &[u8]) {
        if msg.is_reference() || !msg.metadata.cacheable {
            return;
        }

        let generation = self.generation;
        match self.entries.get_mut(&msg.hash) {
            Some(entry) => entry.last_touched_generation = generation,
            None => {
                trace!(hash = %msg.hash, bytes = raw.len(), "Caching message");
                self.entries.insert(
                    msg.hash.clone(),
                    CacheEntry {
                        payload: raw.to_vec(),
                        last_touched_generation: generation,
                    },
                );
            }
        }
    }

    /// Look up the payload for `hash`, refreshing its generation on a hit.
    pub fn resolve(&mut self, hash: &str) -> Option<Vec<u8>> {
        let generation = self.generation;
        let entry = self.entries.get_mut(hash)?;
        entry.last_touched_generation = generation;
        Some(entry.payload.clone())
    }

    /// Count one completed run and evict entries unused for more than
    /// `max_age` runs. Returns the number of evicted entries.
    pub fn advance_generation(&mut self, max_age: u64) -> usize {
        self.generation += 1;
        let generation = self.generation;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| generation - entry.last_touched_generation <= max_age);
        let evicted = before - self.entries.len();
        debug!(generation, evicted, remaining = self.entries.len(), "Advanced cache generation");
        evicted
    }
}

/// What to do when a reference names a hash the cache does not hold.
#[derive(Clone, Default)]
pub enum MissPolicy {
    /// The sender promised the payload was known; a miss is a protocol error.
    #[default]
    Fatal,
    /// Fetch the payload by hash from an external endpoint.
    Fetch(Arc<dyn PayloadFetcher>),
}

impl std::fmt::Debug for MissPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissPolicy::Fatal => write!(f, "Fatal"),
            MissPolicy::Fetch(_) => write!(f, "Fetch(..)"),
        }
    }
}

impl MissPolicy {
    /// Start recovering the payload for `hash`.
    pub fn recover(&self, hash: &str) -> Result<BoxFuture<'static, Result<Vec<u8>, CacheError>>, CacheError> {
        match self {
            MissPolicy::Fatal => Err(CacheError::Miss(hash.to_string())),
            MissPolicy::Fetch(fetcher) => {
                let fetcher = fetcher.clone();
                let hash = hash.to_string();
                Ok(async move { fetcher.fetch_by_hash(&hash).await }.boxed())
            }
        }
    }
}
