//! Preview records cached by the paged result stores
//!
//! Lightweight list-row representations of catalog content. The stores treat
//! them as opaque values.

use serde::{Deserialize, Serialize};

/// Movie row in discovery, search and trending lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePreview {
    pub id: u64,
    pub title: String,
    pub release_year: Option<i32>,
    pub poster_path: Option<String>,
}

impl MoviePreview {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            release_year: None,
            poster_path: None,
        }
    }
}

/// TV series row in discovery, search and trending lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TVSeriesPreview {
    pub id: u64,
    pub name: String,
    pub first_air_year: Option<i32>,
    pub poster_path: Option<String>,
}

impl TVSeriesPreview {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            first_air_year: None,
            poster_path: None,
        }
    }
}

/// Person row in search and trending lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonPreview {
    pub id: u64,
    pub name: String,
    pub known_for_department: Option<String>,
}

/// Mixed-media search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "snake_case")]
pub enum MediaPreview {
    Movie(MoviePreview),
    TvSeries(TVSeriesPreview),
    Person(PersonPreview),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}
