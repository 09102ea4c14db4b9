//! Discovery filters for movies and TV series.

use serde::{Deserialize, Serialize};

use super::key::{CacheFilter, KeyEncoder};

/// Release-year constraint of a discovery query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YearFilter {
    On(i32),
    From(i32),
    UpTo(i32),
    /// Inclusive range. Bounds given in either order describe the same range.
    Between(i32, i32),
}

impl YearFilter {
    fn encoding(&self) -> (&'static str, Vec<i32>) {
        match *self {
            YearFilter::On(year) => ("on", vec![year]),
            YearFilter::From(year) => ("from", vec![year]),
            YearFilter::UpTo(year) => ("upto", vec![year]),
            YearFilter::Between(a, b) => ("between", vec![a.min(b), a.max(b)]),
        }
    }

    /// Whether `year` satisfies the constraint.
    pub fn contains(&self, year: i32) -> bool {
        match *self {
            YearFilter::On(y) => year == y,
            YearFilter::From(y) => year >= y,
            YearFilter::UpTo(y) => year <= y,
            YearFilter::Between(a, b) => (a.min(b)..=a.max(b)).contains(&year),
        }
    }
}

fn encode_year(encoder: &mut KeyEncoder, name: &str, year: Option<&YearFilter>) {
    let encoded = year.map(YearFilter::encoding);
    encoder.opt_variant(
        name,
        encoded
            .as_ref()
            .map(|(variant, args)| (*variant, args.as_slice())),
    );
}

// == Discover Movies ==
/// Narrowing criteria of a movie discovery query.
///
/// Field order in the key: `original_language`, `genres`, `primary_release_year`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverMoviesFilter {
    pub original_language: Option<String>,
    /// Genre ids; order and duplicates are not significant.
    pub genres: Option<Vec<u32>>,
    pub primary_release_year: Option<YearFilter>,
}

impl DiscoverMoviesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.original_language = Some(language.into());
        self
    }

    /// Adds one genre id, creating the genre list if absent.
    pub fn genre(mut self, genre_id: u32) -> Self {
        self.genres.get_or_insert_with(Vec::new).push(genre_id);
        self
    }

    pub fn release_year(mut self, year: YearFilter) -> Self {
        self.primary_release_year = Some(year);
        self
    }
}

impl CacheFilter for DiscoverMoviesFilter {
    fn kind(&self) -> &'static str {
        "discover-movies"
    }

    fn encode_fields(&self, encoder: &mut KeyEncoder) {
        encoder
            .opt_str("original_language", self.original_language.as_deref())
            .opt_set("genres", self.genres.as_deref());
        encode_year(encoder, "primary_release_year", self.primary_release_year.as_ref());
    }
}

// == Discover TV Series ==
/// Narrowing criteria of a TV series discovery query.
///
/// Field order in the key: `original_language`, `genres`, `first_air_date_year`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverTVSeriesFilter {
    pub original_language: Option<String>,
    pub genres: Option<Vec<u32>>,
    pub first_air_date_year: Option<YearFilter>,
}

impl DiscoverTVSeriesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.original_language = Some(language.into());
        self
    }

    pub fn genre(mut self, genre_id: u32) -> Self {
        self.genres.get_or_insert_with(Vec::new).push(genre_id);
        self
    }

    pub fn first_air_year(mut self, year: YearFilter) -> Self {
        self.first_air_date_year = Some(year);
        self
    }
}

impl CacheFilter for DiscoverTVSeriesFilter {
    fn kind(&self) -> &'static str {
        "discover-tv"
    }

    fn encode_fields(&self, encoder: &mut KeyEncoder) {
        encoder
            .opt_str("original_language", self.original_language.as_deref())
            .opt_set("genres", self.genres.as_deref());
        encode_year(encoder, "first_air_date_year", self.first_air_date_year.as_ref());
    }
}
