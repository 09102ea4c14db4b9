//! Paging Module
//!
//! Paginated result cache: discrete pages per filter key plus a live stream
//! of each filter's cumulative results.

mod series;
mod store;
mod stream;

#[cfg(test)]
mod property_tests;

pub use series::PagedSeries;
pub use store::{PageItem, PagedResultStore};
pub use stream::{MergedResults, ResultBroadcaster, ResultStream};
