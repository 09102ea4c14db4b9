//! Filter Module
//!
//! Domain query filters and their canonical [`FilterKey`] encoding.

pub mod discover;
mod key;
pub mod search;

pub use discover::{DiscoverMoviesFilter, DiscoverTVSeriesFilter, YearFilter};
pub use key::{CacheFilter, FilterKey, KeyEncoder};
pub use search::SearchFilter;
