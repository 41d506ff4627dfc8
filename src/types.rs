//! Core data types shared across the watcher

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of one marketplace listing: its absolute URL.
///
/// Equality and hashing are by exact string value, no normalization.
/// Adapters strip trailing referral parameters before constructing one,
/// otherwise the same listing would show up as two distinct refs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(String);

impl ItemRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full details of one listing, fetched when the listing is first seen.
///
/// Built once per notification event and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    /// Seller-declared condition, where the marketplace exposes one.
    pub condition: Option<String>,
    pub is_new: bool,
    pub in_stock: bool,
    pub photo_url: String,
    /// Local path of the downloaded photo; `None` when the download failed.
    pub photo_local: Option<PathBuf>,
    pub url: ItemRef,
    pub discovered_at: DateTime<Utc>,
}

/// One page of search results, in the order the source returned them.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub items: Vec<ItemRef>,
    /// `Some(false)` when the source signalled the end of results,
    /// `None` when it cannot tell.
    pub has_more: Option<bool>,
}
