//! In-memory evaluation cache with lazy expiry and a hard entry bound
//!
//! Entries are keyed by a SHA-256 content hash and kept in insertion
//! order, so the front of the map is always the oldest entry. Lookups drop
//! stale entries; inserts evict from the front until the bound holds.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

/// Separator placed between hashed segments so `["ab", "c"]` and `["a", "bc"]` differ
const SEGMENT_SEPARATOR: &[u8] = b"\n\x1f\n";

/// Number of hex characters kept from the digest
const HASH_LEN: usize = 16;

/// A cached value and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

/// Bounded TTL cache shared across concurrent requests
///
/// A single mutex guards the map, so lookup-with-expiry and
/// insert-with-eviction are each atomic with respect to one another.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<IndexMap<String, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache
    ///
    /// A capacity of zero is raised to one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Look up a live entry, removing it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.created_at.elapsed() >= self.ttl,
        };

        if expired {
            entries.shift_remove(key);
            drop(entries);
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store a value, evicting the oldest entries while over capacity
    ///
    /// Re-inserting an existing key refreshes its timestamp and moves it to
    /// the back of the eviction order.
    pub fn insert(&self, key: String, value: V) {
        let mut entries = self.lock();

        entries.shift_remove(&key);
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );

        let mut evicted = 0usize;
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
            evicted += 1;
        }
        let len = entries.len();
        drop(entries);

        if evicted > 0 {
            tracing::debug!(evicted, len, "evicted oldest cache entries");
        }
    }

    /// Number of stored entries, including any not yet lazily expired
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Configured time-to-live
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, CacheEntry<V>>> {
        // Every mutation completes before the guard drops, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Compute an order-sensitive content hash over text segments
pub fn content_hash<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            hasher.update(SEGMENT_SEPARATOR);
        }
        hasher.update(segment.as_bytes());
    }

    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}
