//! Cache Statistics Module
//!
//! Counters describing how lookups against an expiring cache resolved.

use serde::Serialize;

// == Cache Stats ==
/// Lookup outcomes since the cache was created.
///
/// A lookup that finds an expired entry evicts it and counts both as an
/// expiration and as a miss, so `hits + misses` is always the lookup total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups that found nothing live, including lazy expirations
    pub misses: u64,
    pub expirations: u64,
    /// Live entry count at the time the snapshot was taken
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups served from the cache; 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.record_miss();
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
