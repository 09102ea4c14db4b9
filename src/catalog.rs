//! Catalog Cache Module
//!
//! One independent cache or paged store per content domain, wired from
//! [`Config`].

use std::sync::Arc;

use crate::cache::{ExpiringCache, TypedCache};
use crate::config::Config;
use crate::error::StorageError;
use crate::models::{Genre, MediaPreview, MoviePreview, PersonPreview, TVSeriesPreview};
use crate::paging::PagedResultStore;
use crate::storage::StorageEngine;

/// Genre lists are cached per media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenreKind {
    Movie,
    TVSeries,
}

/// Caches for every catalog domain.
///
/// Paged stores share one storage engine but each writes under its own
/// namespace, so no two domains see each other's series.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    /// API configuration values of unrelated types
    pub configuration: TypedCache,
    pub genres: ExpiringCache<GenreKind, Vec<Genre>>,
    pub discover_movies: Arc<PagedResultStore<MoviePreview>>,
    pub discover_tv_series: Arc<PagedResultStore<TVSeriesPreview>>,
    pub search: Arc<PagedResultStore<MediaPreview>>,
    pub trending_movies: Arc<PagedResultStore<MoviePreview>>,
    pub trending_tv_series: Arc<PagedResultStore<TVSeriesPreview>>,
    pub trending_people: Arc<PagedResultStore<PersonPreview>>,
}

impl CatalogCache {
    /// Builds every domain cache from configuration.
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage = config.storage().await?;
        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: &Config, storage: Arc<dyn StorageEngine>) -> Self {
        Self {
            configuration: TypedCache::with_default_ttl(Some(config.configuration_ttl())),
            genres: ExpiringCache::with_default_ttl(Some(config.genres_ttl())),
            discover_movies: Arc::new(PagedResultStore::new("discover-movies", storage.clone())),
            discover_tv_series: Arc::new(PagedResultStore::new("discover-tv", storage.clone())),
            search: Arc::new(PagedResultStore::new("search", storage.clone())),
            trending_movies: Arc::new(PagedResultStore::new("trending-movies", storage.clone())),
            trending_tv_series: Arc::new(PagedResultStore::new("trending-tv", storage.clone())),
            trending_people: Arc::new(PagedResultStore::new("trending-people", storage)),
        }
    }
}
