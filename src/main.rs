//! Catalog Cache demo
//!
//! Simulates an infinite-scroll discovery session against the paged result
//! store: a subscriber renders the growing result list while "next page"
//! loads and a background refresh write pages concurrently.

use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_cache::catalog::GenreKind;
use catalog_cache::filter::{DiscoverMoviesFilter, YearFilter};
use catalog_cache::models::{Genre, MoviePreview};
use catalog_cache::{CatalogCache, Config};

const PAGE_SIZE: u64 = 20;

/// Stand-in for the remote catalog API.
async fn fetch_remote_page(page: u32) -> Vec<MoviePreview> {
    tokio::time::sleep(Duration::from_millis(25)).await;
    let first = u64::from(page - 1) * PAGE_SIZE;
    (first..first + PAGE_SIZE)
        .map(|id| MoviePreview {
            release_year: Some(1990 + (id % 10) as i32),
            ..MoviePreview::new(id, format!("Movie #{id}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_cache=info,catalog_cache_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: configuration_ttl={}s, genres_ttl={}s, storage={:?}, pages={}",
        config.configuration_ttl, config.genres_ttl, config.storage_dir, config.demo_pages
    );
    if config.demo_pages == 0 {
        bail!("DEMO_PAGES must be at least 1");
    }

    let catalog = CatalogCache::from_config(&config)
        .await
        .context("failed to open catalog storage")?;

    catalog
        .genres
        .set_item(
            GenreKind::Movie,
            vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
        )
        .await;
    catalog
        .configuration
        .set_item("images.base_url", "https://image.example/t/p/".to_string())
        .await;

    let filter = DiscoverMoviesFilter::new()
        .language("en")
        .genre(28)
        .release_year(YearFilter::Between(1990, 1999));
    info!(filter = %catalog_cache::FilterKey::encode(&filter), "discovering");

    // Start from a clean series so reruns over durable storage behave the same
    catalog
        .discover_movies
        .flush(&catalog_cache::FilterKey::encode(&filter))
        .await?;

    let expected = config.demo_pages as usize * PAGE_SIZE as usize;
    let mut stream = catalog.discover_movies.stream_for(&filter).await?;
    let renderer = tokio::spawn(async move {
        while let Some(results) = stream.next().await {
            match results {
                None => info!("nothing fetched yet"),
                Some(items) => {
                    info!(items = items.len(), "rendering results");
                    if items.len() >= expected {
                        return items.len();
                    }
                }
            }
        }
        0
    });

    let refresh_store = catalog.discover_movies.clone();
    let refresh_filter = filter.clone();
    let refresher = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        let items = fetch_remote_page(1).await;
        debug!("background refresh of page 1");
        refresh_store.set_page_for(&refresh_filter, 1, items).await
    });

    for _ in 0..config.demo_pages {
        let page = catalog.discover_movies.next_page_for(&filter).await?;
        let items = fetch_remote_page(page).await;
        catalog
            .discover_movies
            .set_page_for(&filter, page, items)
            .await?;
        info!(page, "page loaded");
    }

    refresher.await.context("refresh task panicked")??;
    let rendered = tokio::time::timeout(Duration::from_secs(5), renderer)
        .await
        .context("renderer did not catch up")?
        .context("renderer task panicked")?;

    let base_url: Option<String> = catalog.configuration.item("images.base_url").await;
    let genres = catalog.genres.item(&GenreKind::Movie).await.map(|g| g.len());
    let current_page = catalog.discover_movies.current_page_for(&filter).await?;
    info!(
        rendered,
        ?current_page,
        ?genres,
        ?base_url,
        "session complete"
    );

    Ok(())
}
