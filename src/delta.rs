//! New-listing detection against previously seen identifiers

use crate::types::ItemRef;
use std::collections::HashSet;

/// Accumulated identifiers already observed for one keyword/filter.
///
/// Grows monotonically for the lifetime of its monitor: items are never
/// removed, even when later delisted. Memory use therefore grows unboundedly
/// over very long runs, which is acceptable for this utility's lifecycle.
#[derive(Debug, Default)]
pub struct SeenItems {
    refs: HashSet<ItemRef>,
}

impl SeenItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the set from an initial sweep snapshot.
    pub fn seed(items: impl IntoIterator<Item = ItemRef>) -> Self {
        Self {
            refs: items.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, item: ItemRef) -> bool {
        self.refs.insert(item)
    }

    pub fn contains(&self, item: &ItemRef) -> bool {
        self.refs.contains(item)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Items on `page` that are not yet in `known`, in page order.
///
/// Pure: does not touch `known`. The caller decides when the returned refs
/// are inserted, so a later detail-fetch failure cannot silently drop an
/// item from future detection.
///
/// Only the first results page is diffed each poll cycle. This assumes the
/// marketplace's default sort surfaces the newest listings on page one; if a
/// source ever changes its default ordering, detection quietly degrades to
/// whatever still reaches the first page.
pub fn find_new(page: &[ItemRef], known: &SeenItems) -> Vec<ItemRef> {
    page.iter()
        .filter(|item| !known.contains(item))
        .cloned()
        .collect()
}
