//! Catalog Cache - local caching and incremental pagination for catalog browsing
//!
//! Provides an expiring key-value cache with lazy TTL eviction and a
//! per-filter paged result store that streams cumulative results to live
//! subscribers.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod paging;
pub mod storage;

pub use cache::{ExpiringCache, TypedCache};
pub use catalog::CatalogCache;
pub use config::Config;
pub use error::{Result, StorageError, StoreError};
pub use filter::{CacheFilter, FilterKey};
pub use paging::{PagedResultStore, ResultStream};
pub use storage::{FileStorage, MemoryStorage, StorageEngine};
