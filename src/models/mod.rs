//! Data Models Module
//!
//! Catalog records held by the caches.

mod preview;

pub use preview::{Genre, MediaPreview, MoviePreview, PersonPreview, TVSeriesPreview};
