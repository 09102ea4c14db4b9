//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration.

mod entry;
mod stats;
mod store;
mod typed;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{EntryTable, ExpiringCache};
pub use typed::TypedCache;
