//! Typed Cache Module
//!
//! Heterogeneous expiring cache: one table holding values of unrelated types,
//! read back with a checked downcast.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheStats, ExpiringCache};

type AnyValue = Arc<dyn Any + Send + Sync>;

/// String-keyed cache storing values of any `'static` type.
///
/// Reading a key with a type other than the one it was stored with yields
/// `None`, the same as a miss; the entry itself is left in place.
#[derive(Debug, Clone, Default)]
pub struct TypedCache {
    inner: ExpiringCache<String, AnyValue>,
}

impl TypedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_ttl(default_ttl: Option<Duration>) -> Self {
        Self {
            inner: ExpiringCache::with_default_ttl(default_ttl),
        }
    }

    /// Returns a clone of the stored value if present, unexpired and of type `T`.
    pub async fn item<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        let stored = self.inner.item(&key.to_string()).await?;
        let value = (*stored).downcast_ref::<T>().cloned();
        if value.is_none() {
            debug!(key, expected = std::any::type_name::<T>(), "typed cache type mismatch");
        }
        value
    }

    pub async fn set_item<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.inner.set_item(key.into(), Arc::new(value)).await;
    }

    pub async fn set_item_with_ttl<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Any + Send + Sync,
    {
        self.inner
            .set_item_with_ttl(key.into(), Arc::new(value), ttl)
            .await;
    }

    pub async fn remove_item(&self, key: &str) {
        self.inner.remove_item(&key.to_string()).await;
    }

    pub async fn flush(&self) {
        self.inner.flush().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}
