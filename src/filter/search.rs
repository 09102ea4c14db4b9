//! Free-text search filter.

use serde::{Deserialize, Serialize};

use super::key::{CacheFilter, KeyEncoder};

/// Search query scoping a paged result series.
///
/// The query is matched case-insensitively with surrounding whitespace
/// ignored, so `" Alien "` and `"alien"` share a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub query: String,
    pub include_adult: bool,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            include_adult: false,
        }
    }

    pub fn include_adult(mut self, include_adult: bool) -> Self {
        self.include_adult = include_adult;
        self
    }

    fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }
}

impl CacheFilter for SearchFilter {
    fn kind(&self) -> &'static str {
        "search"
    }

    fn encode_fields(&self, encoder: &mut KeyEncoder) {
        encoder
            .str("query", &self.normalized_query())
            .value("include_adult", self.include_adult);
    }
}
