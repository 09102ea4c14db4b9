//! Paged Result Store Module
//!
//! Per-filter page storage with live cumulative result streams.
//!
//! Every filter key owns a slot guarded by its own mutex: page writes, storage
//! I/O and stream publication for a key run under that mutex, so writes to one
//! key are strictly serialized and publish in commit order, while writers to
//! different keys only share the brief slot lookup.
//!
//! A slot stays resident while its series has pages or while someone is
//! subscribed to it. Reads of keys with nothing stored never create one, and
//! an idle slot is released once its series is flushed or found empty.
//!
//! Storage layout per namespace `ns` (filter keys are length-prefixed so no
//! key can alias another):
//!
//! - `ns#<len>#<filter>:index`: JSON array of page numbers
//! - `ns#<len>#<filter>:page:<n>`: JSON array of items
//! - `ns#series`: JSON array of every filter key with a committed page

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::filter::{CacheFilter, FilterKey};
use crate::paging::{MergedResults, PagedSeries, ResultBroadcaster, ResultStream};
use crate::storage::{MemoryStorage, StorageEngine};

/// Bounds an item type must meet to be stored in a [`PagedResultStore`].
pub trait PageItem: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> PageItem for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

// == Series Slot ==
#[derive(Debug)]
struct SeriesSlot<T> {
    /// None until hydrated from storage
    series: Option<PagedSeries<T>>,
    broadcaster: ResultBroadcaster<T>,
    /// Set once the slot has left the map; holders must look it up again
    retired: bool,
}

impl<T> SeriesSlot<T> {
    fn new() -> Self {
        Self {
            series: None,
            broadcaster: ResultBroadcaster::new(),
            retired: false,
        }
    }

    fn is_idle(&self) -> bool {
        let empty = self.series.as_ref().map_or(true, PagedSeries::is_empty);
        empty && self.broadcaster.subscriber_count() == 0
    }
}

type SlotGuard<T> = OwnedMutexGuard<SeriesSlot<T>>;

// == Paged Result Store ==
/// Paginated result cache scoped by [`FilterKey`].
///
/// One instance serves one content domain; instances never share state.
#[derive(Debug)]
pub struct PagedResultStore<T> {
    namespace: String,
    storage: Arc<dyn StorageEngine>,
    slots: Mutex<HashMap<FilterKey, Arc<Mutex<SeriesSlot<T>>>>>,
    /// Filter keys with persisted pages; None until loaded
    registry: Mutex<Option<BTreeSet<FilterKey>>>,
}

impl<T: PageItem> PagedResultStore<T> {
    // == Constructor ==
    /// Creates a store persisting through `storage` under `namespace`.
    pub fn new(namespace: impl Into<String>, storage: Arc<dyn StorageEngine>) -> Self {
        Self {
            namespace: namespace.into(),
            storage,
            slots: Mutex::new(HashMap::new()),
            registry: Mutex::new(None),
        }
    }

    /// Creates a store backed by a private [`MemoryStorage`].
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(namespace, Arc::new(MemoryStorage::new()))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // == Page ==
    /// Items stored for `page` under `key`, or None if never written.
    pub async fn page(&self, key: &FilterKey, page: u32) -> Result<Option<Vec<T>>> {
        self.read_series(key, |series| series.page(page).map(<[T]>::to_vec))
            .await
    }

    // == Current Page ==
    /// Highest page written under `key`, or None.
    pub async fn current_page(&self, key: &FilterKey) -> Result<Option<u32>> {
        self.read_series(key, PagedSeries::current_page).await
    }

    /// Page to request next from the remote source: `current_page + 1`, or 1.
    pub async fn next_page(&self, key: &FilterKey) -> Result<u32> {
        Ok(self
            .current_page(key)
            .await?
            .map_or(1, |page| page.saturating_add(1)))
    }

    /// Cumulative results for `key`, as the stream would currently emit them.
    pub async fn results(&self, key: &FilterKey) -> Result<MergedResults<T>> {
        self.read_series(key, PagedSeries::merged).await
    }

    // == Set Page ==
    /// Stores `items` as `page` under `key`, replacing any previous items.
    ///
    /// Pages may be written in any order. On success the new cumulative
    /// results are published to the key's subscribers; on failure neither
    /// memory nor storage reflects the write.
    pub async fn set_page(&self, key: &FilterKey, page: u32, items: Vec<T>) -> Result<()> {
        validate_page(page)?;
        let payload = serde_json::to_vec(&items).map_err(|err| {
            StoreError::unknown_with(format!("failed to encode page {page} of {key}"), err)
        })?;

        let mut slot = self.lock_slot(key).await;
        let result = self.commit_page(key, page, items, payload, &mut slot).await;
        if result.is_err() {
            self.release_if_idle(key, &mut slot).await;
        }
        result
    }

    /// Write order: page blob, index (new pages only), registry (first page
    /// only), memory, subscribers.
    async fn commit_page(
        &self,
        key: &FilterKey,
        page: u32,
        items: Vec<T>,
        payload: Vec<u8>,
        slot: &mut SeriesSlot<T>,
    ) -> Result<()> {
        self.ensure_loaded(key, slot).await?;
        let SeriesSlot {
            series,
            broadcaster,
            ..
        } = slot;
        let series = series.get_or_insert_with(PagedSeries::new);

        if let Err(err) = self.storage.save(&self.page_key(key, page), payload).await {
            warn!(namespace = %self.namespace, filter = %key, page, error = %err, "page write failed");
            return Err(err.into());
        }

        if !series.contains_page(page) {
            let mut numbers = series.page_numbers();
            numbers.push(page);
            numbers.sort_unstable();
            self.save_index(key, &numbers).await?;
        }

        if series.is_empty() {
            if let Err(err) = self.register(key).await {
                // Without a registry entry the series would be invisible to flush_all
                self.discard_series(key, &[page]).await;
                return Err(err);
            }
        }

        let count = items.len();
        series.insert(page, items);
        broadcaster.publish(series.merged());

        debug!(
            namespace = %self.namespace,
            filter = %key,
            page,
            items = count,
            current_page = ?series.current_page(),
            "page stored"
        );
        Ok(())
    }

    // == Remove Page ==
    /// Invalidates one page. Returns whether it was present.
    pub async fn remove_page(&self, key: &FilterKey, page: u32) -> Result<bool> {
        let Some(mut slot) = self.resident_slot(key).await? else {
            return Ok(false);
        };
        let removed = self.remove_loaded_page(key, page, &mut slot).await;
        self.release_if_idle(key, &mut slot).await;
        removed
    }

    async fn remove_loaded_page(
        &self,
        key: &FilterKey,
        page: u32,
        slot: &mut SeriesSlot<T>,
    ) -> Result<bool> {
        self.ensure_loaded(key, slot).await?;
        let SeriesSlot {
            series,
            broadcaster,
            ..
        } = slot;
        let series = series.get_or_insert_with(PagedSeries::new);

        if !series.contains_page(page) {
            return Ok(false);
        }

        let numbers: Vec<u32> = series
            .page_numbers()
            .into_iter()
            .filter(|n| *n != page)
            .collect();
        self.save_index(key, &numbers).await?;

        // The index no longer references the blob; a failed delete only leaks it
        if let Err(err) = self.storage.delete(&self.page_key(key, page)).await {
            warn!(namespace = %self.namespace, filter = %key, page, error = %err, "orphaned page blob");
        }

        series.remove(page);
        broadcaster.publish(series.merged());
        debug!(namespace = %self.namespace, filter = %key, page, "page removed");
        Ok(true)
    }

    // == Flush ==
    /// Drops every page of `key`; its subscribers receive `None`.
    pub async fn flush(&self, key: &FilterKey) -> Result<()> {
        let mut slot = self.lock_slot(key).await;
        let flushed = self.flush_loaded(key, &mut slot).await;
        self.release_if_idle(key, &mut slot).await;
        flushed
    }

    async fn flush_loaded(&self, key: &FilterKey, slot: &mut SeriesSlot<T>) -> Result<()> {
        self.ensure_loaded(key, slot).await?;
        let SeriesSlot {
            series,
            broadcaster,
            ..
        } = slot;
        let series = series.get_or_insert_with(PagedSeries::new);

        self.storage.delete(&self.index_key(key)).await?;
        for page in series.page_numbers() {
            if let Err(err) = self.storage.delete(&self.page_key(key, page)).await {
                warn!(namespace = %self.namespace, filter = %key, page, error = %err, "orphaned page blob");
            }
        }
        if let Err(err) = self.deregister(key).await {
            warn!(namespace = %self.namespace, filter = %key, error = %err, "stale series registry entry");
        }

        series.clear();
        broadcaster.publish(None);
        info!(namespace = %self.namespace, filter = %key, "series flushed");
        Ok(())
    }

    /// Drops every series this namespace holds. Returns how many were flushed.
    pub async fn flush_all(&self) -> Result<usize> {
        // Every series with pages was registered by its first write
        let keys = self.registered_keys().await?;
        for key in &keys {
            self.flush(key).await?;
        }
        info!(namespace = %self.namespace, series = keys.len(), "store flushed");
        Ok(keys.len())
    }

    // == Stream ==
    /// Opens a live subscription to the cumulative results of `key`.
    pub async fn stream(&self, key: &FilterKey) -> Result<ResultStream<T>> {
        let mut slot = self.lock_slot(key).await;
        if let Err(err) = self.ensure_loaded(key, &mut slot).await {
            self.release_if_idle(key, &mut slot).await;
            return Err(err);
        }
        Ok(slot.broadcaster.subscribe())
    }

    /// Number of live subscriptions on `key`.
    pub async fn subscriber_count(&self, key: &FilterKey) -> usize {
        let slot = self.slots.lock().await.get(key).cloned();
        match slot {
            Some(slot) => slot.lock().await.broadcaster.subscriber_count(),
            None => 0,
        }
    }

    // == Filter Conveniences ==
    pub async fn page_for<F: CacheFilter>(&self, filter: &F, page: u32) -> Result<Option<Vec<T>>> {
        self.page(&filter.filter_key(), page).await
    }

    pub async fn current_page_for<F: CacheFilter>(&self, filter: &F) -> Result<Option<u32>> {
        self.current_page(&filter.filter_key()).await
    }

    pub async fn next_page_for<F: CacheFilter>(&self, filter: &F) -> Result<u32> {
        self.next_page(&filter.filter_key()).await
    }

    pub async fn set_page_for<F: CacheFilter>(
        &self,
        filter: &F,
        page: u32,
        items: Vec<T>,
    ) -> Result<()> {
        self.set_page(&filter.filter_key(), page, items).await
    }

    pub async fn stream_for<F: CacheFilter>(&self, filter: &F) -> Result<ResultStream<T>> {
        self.stream(&filter.filter_key()).await
    }

    // == Slots ==
    /// Locks the live slot for `key`, creating it if needed.
    async fn lock_slot(&self, key: &FilterKey) -> SlotGuard<T> {
        loop {
            let slot = Arc::clone(
                self.slots
                    .lock()
                    .await
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(SeriesSlot::new()))),
            );
            let guard = slot.lock_owned().await;
            if !guard.retired {
                return guard;
            }
        }
    }

    async fn lock_existing_slot(&self, key: &FilterKey) -> Option<SlotGuard<T>> {
        loop {
            let slot = self.slots.lock().await.get(key).cloned()?;
            let guard = slot.lock_owned().await;
            if !guard.retired {
                return Some(guard);
            }
        }
    }

    /// Locks the slot for `key` if it is live or has an index in storage.
    async fn resident_slot(&self, key: &FilterKey) -> Result<Option<SlotGuard<T>>> {
        if let Some(slot) = self.lock_existing_slot(key).await {
            return Ok(Some(slot));
        }
        if self
            .load_json::<Vec<u32>>(&self.index_key(key))
            .await?
            .is_none()
        {
            return Ok(None);
        }
        Ok(Some(self.lock_slot(key).await))
    }

    /// Removes an empty, unsubscribed slot from the map.
    async fn release_if_idle(&self, key: &FilterKey, slot: &mut SeriesSlot<T>) {
        if slot.retired || !slot.is_idle() {
            return;
        }
        slot.retired = true;
        self.slots.lock().await.remove(key);
    }

    async fn read_series<R>(
        &self,
        key: &FilterKey,
        read: impl FnOnce(&PagedSeries<T>) -> R,
    ) -> Result<R> {
        let Some(mut slot) = self.resident_slot(key).await? else {
            return Ok(read(&PagedSeries::new()));
        };
        if let Err(err) = self.ensure_loaded(key, &mut slot).await {
            self.release_if_idle(key, &mut slot).await;
            return Err(err);
        }
        let value = read(&*slot.series.get_or_insert_with(PagedSeries::new));
        self.release_if_idle(key, &mut slot).await;
        Ok(value)
    }

    /// Hydrates the slot from storage on first access and publishes what
    /// was found.
    async fn ensure_loaded(&self, key: &FilterKey, slot: &mut SeriesSlot<T>) -> Result<()> {
        if slot.series.is_some() {
            return Ok(());
        }
        let series = self.load_series(key).await?;
        if !series.is_empty() {
            debug!(
                namespace = %self.namespace,
                filter = %key,
                pages = series.page_numbers().len(),
                "series hydrated"
            );
            slot.broadcaster.publish(series.merged());
        }
        slot.series = Some(series);
        Ok(())
    }

    async fn load_series(&self, key: &FilterKey) -> Result<PagedSeries<T>> {
        let mut series = PagedSeries::new();
        let Some(numbers) = self.load_json::<Vec<u32>>(&self.index_key(key)).await? else {
            return Ok(series);
        };
        for page in numbers {
            match self.load_json::<Vec<T>>(&self.page_key(key, page)).await? {
                Some(items) => {
                    series.insert(page, items);
                }
                None => {
                    warn!(namespace = %self.namespace, filter = %key, page, "indexed page missing");
                }
            }
        }
        Ok(series)
    }

    /// Loads and decodes a blob. Undecodable blobs count as absent.
    async fn load_json<V: DeserializeOwned>(&self, storage_key: &str) -> Result<Option<V>> {
        let Some(bytes) = self.storage.load(storage_key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(namespace = %self.namespace, key = storage_key, error = %err, "corrupt blob ignored");
                Ok(None)
            }
        }
    }

    async fn save_index(&self, key: &FilterKey, numbers: &[u32]) -> Result<()> {
        let payload = serde_json::to_vec(numbers)
            .map_err(|err| StoreError::unknown_with("failed to encode page index", err))?;
        self.storage.save(&self.index_key(key), payload).await?;
        Ok(())
    }

    /// Best-effort removal of an unregistered series' index and pages.
    async fn discard_series(&self, key: &FilterKey, pages: &[u32]) {
        let blobs = pages
            .iter()
            .map(|page| self.page_key(key, *page))
            .chain(std::iter::once(self.index_key(key)));
        for blob in blobs {
            if let Err(err) = self.storage.delete(&blob).await {
                warn!(namespace = %self.namespace, key = %blob, error = %err, "orphaned blob");
            }
        }
    }

    // == Registry ==
    // The registry lock is held across its save so the persisted set never
    // loses a concurrent insert. Only a series' first page and its flush take it.
    async fn registered_keys(&self) -> Result<BTreeSet<FilterKey>> {
        let mut registry = self.registry.lock().await;
        Ok(self.load_registry(&mut registry).await?.clone())
    }

    async fn register(&self, key: &FilterKey) -> Result<()> {
        let mut registry = self.registry.lock().await;
        let known = self.load_registry(&mut registry).await?;
        if known.contains(key) {
            return Ok(());
        }
        let mut updated = known.clone();
        updated.insert(key.clone());
        self.save_registry(&updated).await?;
        *known = updated;
        Ok(())
    }

    async fn deregister(&self, key: &FilterKey) -> Result<()> {
        let mut registry = self.registry.lock().await;
        let known = self.load_registry(&mut registry).await?;
        if !known.contains(key) {
            return Ok(());
        }
        let mut updated = known.clone();
        updated.remove(key);
        self.save_registry(&updated).await?;
        *known = updated;
        Ok(())
    }

    async fn load_registry<'a>(
        &self,
        registry: &'a mut Option<BTreeSet<FilterKey>>,
    ) -> Result<&'a mut BTreeSet<FilterKey>> {
        if registry.is_none() {
            let raw: Vec<String> = self
                .load_json(&self.registry_key())
                .await?
                .unwrap_or_default();
            *registry = Some(raw.into_iter().map(FilterKey::from_raw).collect());
        }
        Ok(registry.get_or_insert_with(BTreeSet::new))
    }

    async fn save_registry(&self, keys: &BTreeSet<FilterKey>) -> Result<()> {
        let raw: Vec<&str> = keys.iter().map(FilterKey::as_str).collect();
        let payload = serde_json::to_vec(&raw)
            .map_err(|err| StoreError::unknown_with("failed to encode series registry", err))?;
        self.storage.save(&self.registry_key(), payload).await?;
        Ok(())
    }

    // == Storage Keys ==
    fn series_prefix(&self, key: &FilterKey) -> String {
        format!("{}#{}#{}", self.namespace, key.as_str().len(), key)
    }

    fn index_key(&self, key: &FilterKey) -> String {
        format!("{}:index", self.series_prefix(key))
    }

    fn page_key(&self, key: &FilterKey, page: u32) -> String {
        format!("{}:page:{}", self.series_prefix(key), page)
    }

    fn registry_key(&self) -> String {
        format!("{}#series", self.namespace)
    }
}

fn validate_page(page: u32) -> Result<()> {
    if page == 0 {
        return Err(StoreError::unknown("page numbers start at 1, got 0"));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn key(name: &str) -> FilterKey {
        FilterKey::from_raw(name)
    }

    /// Memory engine whose saves can be made to fail, either all of them or
    /// only those whose key contains a marker.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_saves: AtomicBool,
        fail_keys_containing: std::sync::Mutex<Option<&'static str>>,
    }

    impl FlakyStorage {
        fn failing_keys(marker: &'static str) -> Self {
            let storage = Self::default();
            *storage.fail_keys_containing.lock().unwrap() = Some(marker);
            storage
        }

        fn heal(&self) {
            self.fail_saves.store(false, Ordering::SeqCst);
            *self.fail_keys_containing.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl StorageEngine for FlakyStorage {
        async fn load(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            self.inner.load(key).await
        }

        async fn save(&self, key: &str, bytes: Vec<u8>) -> std::result::Result<(), StorageError> {
            let marked = self
                .fail_keys_containing
                .lock()
                .unwrap()
                .is_some_and(|marker| key.contains(marker));
            if marked || self.fail_saves.load(Ordering::SeqCst) {
                return Err(StorageError::Backend("disk full".to_string()));
            }
            self.inner.save(key, bytes).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_page_round_trip() {
        let store = PagedResultStore::in_memory("movies");

        store.set_page(&key("f"), 2, vec![10, 20]).await.unwrap();

        assert_eq!(store.page(&key("f"), 2).await.unwrap(), Some(vec![10, 20]));
        assert_eq!(store.page(&key("f"), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_and_next_page() {
        let store = PagedResultStore::in_memory("movies");
        let f = key("f");

        assert_eq!(store.current_page(&f).await.unwrap(), None);
        assert_eq!(store.next_page(&f).await.unwrap(), 1);

        store.set_page(&f, 1, vec![1]).await.unwrap();
        store.set_page(&f, 3, vec![3]).await.unwrap();

        assert_eq!(store.current_page(&f).await.unwrap(), Some(3));
        assert_eq!(store.next_page(&f).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let store = PagedResultStore::in_memory("movies");

        let result = store.set_page(&key("f"), 0, vec![1]).await;

        assert!(matches!(result, Err(StoreError::Unknown { .. })));
        assert_eq!(store.current_page(&key("f")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_page() {
        let store = PagedResultStore::in_memory("movies");
        let f = key("f");

        store.set_page(&f, 1, vec![1, 2]).await.unwrap();
        store.set_page(&f, 1, vec![3]).await.unwrap();

        assert_eq!(store.page(&f, 1).await.unwrap(), Some(vec![3]));
        assert_eq!(store.results(&f).await.unwrap(), Some(vec![3]));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let storage = Arc::new(FlakyStorage::default());
        let store = PagedResultStore::new("movies", storage.clone());
        let f = key("f");
        store.set_page(&f, 1, vec![1]).await.unwrap();
        let mut stream = store.stream(&f).await.unwrap();
        assert_eq!(stream.next().await, Some(Some(vec![1])));

        storage.fail_saves.store(true, Ordering::SeqCst);
        let overwrite = store.set_page(&f, 1, vec![9]).await;
        let append = store.set_page(&f, 2, vec![2]).await;

        assert!(matches!(overwrite, Err(StoreError::Persistence(StorageError::Backend(_)))));
        assert!(matches!(append, Err(StoreError::Persistence(_))));
        assert_eq!(store.page(&f, 1).await.unwrap(), Some(vec![1]));
        assert_eq!(store.page(&f, 2).await.unwrap(), None);
        assert_eq!(store.current_page(&f).await.unwrap(), Some(1));
        assert!(!stream.has_pending());
    }

    #[tokio::test]
    async fn test_failed_first_write_on_new_filter() {
        let storage = Arc::new(FlakyStorage::default());
        storage.fail_saves.store(true, Ordering::SeqCst);
        let store = PagedResultStore::new("movies", storage.clone());

        assert!(store.set_page(&key("f"), 1, vec![1]).await.is_err());
        assert_eq!(store.current_page(&key("f")).await.unwrap(), None);
        assert_eq!(store.results(&key("f")).await.unwrap(), None);
        assert_eq!(store.flush_all().await.unwrap(), 0);
        assert_eq!(storage.inner.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_page_save_leaves_no_registry_entry() {
        let storage = Arc::new(FlakyStorage::failing_keys(":page:"));
        let store = PagedResultStore::new("movies", storage.clone());

        let result = store.set_page(&key("f"), 1, vec![1]).await;

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(storage.inner.len().await, 0);
        assert_eq!(store.flush_all().await.unwrap(), 0);

        storage.heal();
        store.set_page(&key("f"), 1, vec![1]).await.unwrap();
        assert_eq!(store.flush_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_registration_discards_written_blobs() {
        let storage = Arc::new(FlakyStorage::failing_keys("#series"));
        let store = PagedResultStore::new("movies", storage.clone());

        assert!(store.set_page(&key("f"), 1, vec![1]).await.is_err());

        assert_eq!(storage.inner.len().await, 0);
        assert_eq!(store.current_page(&key("f")).await.unwrap(), None);

        // Reopening over the same storage finds no trace of the series
        let reopened: PagedResultStore<i32> = PagedResultStore::new("movies", storage.clone());
        assert_eq!(reopened.current_page(&key("f")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_first_writes_all_registered() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(PagedResultStore::new("search", storage.clone()));

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set_page(&key(&format!("q{i}")), 1, vec![i]).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let reopened: PagedResultStore<i32> = PagedResultStore::new("search", storage);
        assert_eq!(reopened.flush_all().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_reads_of_unknown_keys_keep_no_slots() {
        let store: PagedResultStore<u32> = PagedResultStore::in_memory("search");

        for i in 0..200 {
            let f = key(&format!("query {i}"));
            assert_eq!(store.current_page(&f).await.unwrap(), None);
            assert_eq!(store.page(&f, 1).await.unwrap(), None);
            assert_eq!(store.results(&f).await.unwrap(), None);
            assert!(!store.remove_page(&f, 1).await.unwrap());
        }
        assert_eq!(store.slots.lock().await.len(), 0);

        store.set_page(&key("query 0"), 1, vec![1]).await.unwrap();
        assert_eq!(store.slots.lock().await.len(), 1);

        store.flush(&key("query 0")).await.unwrap();
        assert_eq!(store.slots.lock().await.len(), 0);
    }

    #[tokio::test]
    async fn test_subscribed_slot_outlives_flush() {
        let store = PagedResultStore::in_memory("search");
        let f = key("f");
        let mut stream = store.stream(&f).await.unwrap();
        assert_eq!(stream.next().await, Some(None));

        store.flush(&f).await.unwrap();
        assert_eq!(store.slots.lock().await.len(), 1);

        store.set_page(&f, 1, vec![1]).await.unwrap();
        assert_eq!(stream.next().await, Some(Some(vec![1])));

        // Once the last subscriber is gone, the next flush releases the slot
        drop(stream);
        store.flush(&f).await.unwrap();
        assert_eq!(store.slots.lock().await.len(), 0);

        // A fresh subscriber after release still sees later writes
        let mut stream = store.stream(&f).await.unwrap();
        assert_eq!(stream.next().await, Some(None));
        store.set_page(&f, 2, vec![2]).await.unwrap();
        assert_eq!(stream.next().await, Some(Some(vec![2])));
    }

    #[tokio::test]
    async fn test_idle_empty_slot_released_on_read() {
        let store: PagedResultStore<u32> = PagedResultStore::in_memory("search");
        let f = key("f");

        let stream = store.stream(&f).await.unwrap();
        assert_eq!(store.slots.lock().await.len(), 1);
        drop(stream);

        assert_eq!(store.current_page(&f).await.unwrap(), None);
        assert_eq!(store.slots.lock().await.len(), 0);
    }

    #[tokio::test]
    async fn test_hydrates_from_shared_storage() {
        let storage: Arc<dyn StorageEngine> = Arc::new(MemoryStorage::new());
        let f = key("discover|lang=en");

        let first = PagedResultStore::new("movies", storage.clone());
        first.set_page(&f, 1, vec!["a".to_string()]).await.unwrap();
        first.set_page(&f, 2, vec!["b".to_string()]).await.unwrap();
        drop(first);

        let second: PagedResultStore<String> = PagedResultStore::new("movies", storage.clone());
        assert_eq!(second.current_page(&f).await.unwrap(), Some(2));
        let mut stream = second.stream(&f).await.unwrap();
        assert_eq!(
            stream.next().await,
            Some(Some(vec!["a".to_string(), "b".to_string()]))
        );

        // A different namespace over the same storage sees nothing
        let other: PagedResultStore<String> = PagedResultStore::new("tv", storage);
        assert_eq!(other.current_page(&f).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_page_treated_as_miss() {
        let storage = Arc::new(MemoryStorage::new());
        let f = key("f");
        let first = PagedResultStore::new("movies", storage.clone());
        first.set_page(&f, 1, vec![1u32]).await.unwrap();
        first.set_page(&f, 2, vec![2u32]).await.unwrap();
        storage
            .save(&first.page_key(&f, 1), b"{not json".to_vec())
            .await
            .unwrap();

        let second: PagedResultStore<u32> = PagedResultStore::new("movies", storage);

        assert_eq!(second.page(&f, 1).await.unwrap(), None);
        assert_eq!(second.page(&f, 2).await.unwrap(), Some(vec![2]));
        assert_eq!(second.results(&f).await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_remove_page() {
        let store = PagedResultStore::in_memory("movies");
        let f = key("f");
        store.set_page(&f, 1, vec![1]).await.unwrap();
        store.set_page(&f, 2, vec![2]).await.unwrap();
        let mut stream = store.stream(&f).await.unwrap();
        assert_eq!(stream.next().await, Some(Some(vec![1, 2])));

        assert!(store.remove_page(&f, 2).await.unwrap());
        assert!(!store.remove_page(&f, 2).await.unwrap());

        assert_eq!(store.current_page(&f).await.unwrap(), Some(1));
        assert_eq!(stream.next().await, Some(Some(vec![1])));
    }

    #[tokio::test]
    async fn test_flush_one_series() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PagedResultStore::new("movies", storage.clone());
        let (f1, f2) = (key("f1"), key("f2"));
        store.set_page(&f1, 1, vec![1]).await.unwrap();
        store.set_page(&f2, 1, vec![2]).await.unwrap();
        let mut stream = store.stream(&f1).await.unwrap();
        assert_eq!(stream.next().await, Some(Some(vec![1])));

        store.flush(&f1).await.unwrap();

        assert_eq!(stream.next().await, Some(None));
        assert_eq!(store.current_page(&f1).await.unwrap(), None);
        assert_eq!(store.page(&f2, 1).await.unwrap(), Some(vec![2]));

        let reopened: PagedResultStore<i32> = PagedResultStore::new("movies", storage);
        assert_eq!(reopened.current_page(&f1).await.unwrap(), None);
        assert_eq!(reopened.current_page(&f2).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_flush_all_reaches_unloaded_series() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = PagedResultStore::new("movies", storage.clone());
        writer.set_page(&key("f1"), 1, vec![1]).await.unwrap();
        writer.set_page(&key("f2"), 4, vec![4]).await.unwrap();
        drop(writer);

        let store: PagedResultStore<i32> = PagedResultStore::new("movies", storage.clone());
        assert_eq!(store.flush_all().await.unwrap(), 2);

        assert_eq!(store.current_page(&key("f1")).await.unwrap(), None);
        assert_eq!(store.current_page(&key("f2")).await.unwrap(), None);
        // Only the (now empty) registry remains
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_subscriber_count() {
        let store: PagedResultStore<u8> = PagedResultStore::in_memory("movies");
        let f = key("f");
        assert_eq!(store.subscriber_count(&f).await, 0);

        let a = store.stream(&f).await.unwrap();
        let _b = store.stream(&f).await.unwrap();
        assert_eq!(store.subscriber_count(&f).await, 2);

        drop(a);
        assert_eq!(store.subscriber_count(&f).await, 1);
    }

    #[test]
    fn test_storage_keys_do_not_alias() {
        let store: PagedResultStore<u8> = PagedResultStore::in_memory("ns");

        assert_eq!(store.page_key(&key("f"), 3), "ns#1#f:page:3");
        assert_eq!(store.index_key(&key("f")), "ns#1#f:index");
        assert_ne!(
            store.index_key(&key("a:page:1")),
            store.page_key(&key("a"), 1)
        );
    }
}
