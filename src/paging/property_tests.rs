//! Property-Based Tests for Paging Module
//!
//! Drives the paged result store with random write sequences and compares it
//! against a BTreeMap model.

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::filter::FilterKey;
use crate::paging::{PagedResultStore, PagedSeries};

#[derive(Debug, Clone)]
enum PageOp {
    Set { filter: usize, page: u32, items: Vec<u16> },
    Remove { filter: usize, page: u32 },
}

fn page_op_strategy() -> impl Strategy<Value = PageOp> {
    prop_oneof![
        4 => (0usize..2, 1u32..8, prop::collection::vec(any::<u16>(), 0..5))
            .prop_map(|(filter, page, items)| PageOp::Set { filter, page, items }),
        1 => (0usize..2, 1u32..8).prop_map(|(filter, page)| PageOp::Remove { filter, page }),
    ]
}

fn model_merged(model: &BTreeMap<u32, Vec<u16>>) -> Option<Vec<u16>> {
    if model.is_empty() {
        None
    } else {
        Some(model.values().flatten().copied().collect())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Pages, current page and cumulative results always match the model,
    // and each filter only ever sees its own writes.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(page_op_strategy(), 1..40)) {
        let filters = [FilterKey::from_raw("f0"), FilterKey::from_raw("f1")];
        let mut models: [BTreeMap<u32, Vec<u16>>; 2] = Default::default();

        tokio_test::block_on(async {
            let store = PagedResultStore::in_memory("prop");

            for op in ops {
                match op {
                    PageOp::Set { filter, page, items } => {
                        store.set_page(&filters[filter], page, items.clone()).await.unwrap();
                        models[filter].insert(page, items);
                    }
                    PageOp::Remove { filter, page } => {
                        let removed = store.remove_page(&filters[filter], page).await.unwrap();
                        prop_assert_eq!(removed, models[filter].remove(&page).is_some());
                    }
                }
            }

            for (key, model) in filters.iter().zip(models.iter()) {
                prop_assert_eq!(
                    store.current_page(key).await.unwrap(),
                    model.keys().next_back().copied()
                );
                prop_assert_eq!(store.results(key).await.unwrap(), model_merged(model));
                for page in 1u32..8 {
                    prop_assert_eq!(store.page(key, page).await.unwrap(), model.get(&page).cloned());
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    // A subscriber that reads after every write sees each write's merge, in order.
    #[test]
    fn prop_stream_follows_writes(
        writes in prop::collection::vec((1u32..6, prop::collection::vec(any::<u16>(), 0..4)), 1..20)
    ) {
        tokio_test::block_on(async {
            let store = PagedResultStore::in_memory("prop");
            let key = FilterKey::from_raw("f");
            let mut stream = store.stream(&key).await.unwrap();
            prop_assert_eq!(stream.next().await, Some(None));

            let mut model = BTreeMap::new();
            for (page, items) in writes {
                store.set_page(&key, page, items.clone()).await.unwrap();
                model.insert(page, items);
                prop_assert_eq!(stream.next().await, Some(model_merged(&model)));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_series_current_page_is_max(pages in prop::collection::btree_set(1u32..100, 0..20)) {
        let mut series = PagedSeries::new();
        for page in &pages {
            series.insert(*page, vec![*page]);
        }

        prop_assert_eq!(series.current_page(), pages.iter().next_back().copied());
        prop_assert_eq!(series.item_count(), pages.len());
    }
}
