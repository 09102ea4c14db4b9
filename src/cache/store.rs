//! Cache Store Module
//!
//! Expiring key-value cache: a HashMap of entries with lazy TTL eviction,
//! serialized behind a single mutex.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == Entry Table ==
/// Unsynchronized entry map backing [`ExpiringCache`].
#[derive(Debug)]
pub struct EntryTable<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL applied by `set` when the caller gives none; None = unlimited
    default_ttl: Option<Duration>,
}

impl<K, V> EntryTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty table whose plain `set` never expires entries.
    pub fn new() -> Self {
        Self::with_default_ttl(None)
    }

    /// Creates an empty table applying `default_ttl` to plain `set` calls.
    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    // == Get ==
    /// Returns the value if present and unexpired.
    ///
    /// An expired entry is removed on the spot and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                self.entries.remove(key);
                self.stats.record_expiration();
                self.stats.set_total_entries(self.entries.len());
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value with the table's default TTL, overwriting any entry.
    pub fn set(&mut self, key: K, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Stores a value expiring `ttl` from now (None = never), overwriting any entry.
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: Option<Duration>) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Flush ==
    /// Removes all entries. Returns how many were dropped.
    pub fn flush(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for EntryTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Expiring Cache ==
/// Shared handle to an expiring key-value cache.
///
/// Every operation takes the same lock, so concurrent callers never
/// interleave on the backing map. Clones share one table.
#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    table: Arc<Mutex<EntryTable<K, V>>>,
}

impl<K, V> Clone for ExpiringCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    /// Creates a cache whose `set_item` stores without expiry.
    pub fn new() -> Self {
        Self::with_default_ttl(None)
    }

    /// Creates a cache whose `set_item` applies `default_ttl`.
    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            table: Arc::new(Mutex::new(EntryTable::with_default_ttl(default_ttl))),
        }
    }

    /// Returns the value for `key` if present and unexpired.
    pub async fn item(&self, key: &K) -> Option<V> {
        let value = self.table.lock().await.get(key);
        debug!(?key, hit = value.is_some(), "cache lookup");
        value
    }

    /// Stores `value` under `key`, overwriting any existing entry.
    pub async fn set_item(&self, key: K, value: V) {
        self.table.lock().await.set(key, value);
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    pub async fn set_item_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.table.lock().await.set_with_ttl(key, value, Some(ttl));
    }

    /// Removes the entry for `key`; no-op when absent.
    pub async fn remove_item(&self, key: &K) {
        self.table.lock().await.remove(key);
    }

    /// Removes all entries.
    pub async fn flush(&self) {
        let dropped = self.table.lock().await.flush();
        debug!(dropped, "cache flushed");
    }

    pub async fn stats(&self) -> CacheStats {
        self.table.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}

impl<K, V> Default for ExpiringCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
