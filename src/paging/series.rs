//! Paged Series Module
//!
//! Discrete pages of one filter's results.

use std::collections::BTreeMap;

// == Paged Series ==
/// Pages of results for a single filter key, by page number.
///
/// The current page is derived from the stored page numbers, so it always
/// equals the highest page held.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedSeries<T> {
    pages: BTreeMap<u32, Vec<T>>,
}

impl<T> PagedSeries<T> {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Items stored for `page`, if that page was written.
    pub fn page(&self, page: u32) -> Option<&[T]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    pub fn contains_page(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Highest page number held, or None when empty.
    pub fn current_page(&self) -> Option<u32> {
        self.pages.keys().next_back().copied()
    }

    /// Stores `items` as `page`, returning the items it replaced.
    pub fn insert(&mut self, page: u32, items: Vec<T>) -> Option<Vec<T>> {
        self.pages.insert(page, items)
    }

    pub fn remove(&mut self, page: u32) -> Option<Vec<T>> {
        self.pages.remove(&page)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Page numbers held, ascending.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total item count across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}

impl<T: Clone> PagedSeries<T> {
    /// Cumulative merge: every page's items in ascending page order.
    ///
    /// Missing pages contribute nothing. None when no page is held, which
    /// distinguishes "nothing fetched" from "fetched and empty".
    pub fn merged(&self) -> Option<Vec<T>> {
        if self.pages.is_empty() {
            return None;
        }
        let mut merged = Vec::with_capacity(self.item_count());
        for items in self.pages.values() {
            merged.extend(items.iter().cloned());
        }
        Some(merged)
    }
}

impl<T> Default for PagedSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}
