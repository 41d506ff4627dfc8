//! Marketplace source adapters
//!
//! One implementation per marketplace. The polling core only ever talks to
//! the [`Source`] trait; URL templating and markup field extraction live in
//! the concrete adapters.

mod mercari;
mod rakuma;

pub use mercari::Mercari;
pub use rakuma::Rakuma;

use crate::config::Filter;
use crate::error::{Result, WatcherError};
use crate::types::{Item, ItemRef, ListingPage};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A marketplace the watcher can poll.
#[async_trait]
pub trait Source: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Index of the first search results page (source-specific).
    fn first_page(&self) -> u32 {
        0
    }

    /// Fetch one page of search results for `filter`.
    async fn list_page(&self, filter: &Filter, page: u32) -> Result<ListingPage>;

    /// Fetch the full details of one listing, including its photo.
    async fn item_details(&self, item: &ItemRef) -> Result<Item>;
}

/// HTTP client shared by the adapters: bounded wait, browser User-Agent.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(WatcherError::from)
}

/// GET a page and return its body, treating any non-2xx status as a
/// retrieval failure.
pub(crate) async fn fetch_text(http: &Client, url: &str) -> Result<String> {
    debug!("GET {url}");
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WatcherError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response.text().await?)
}

/// Download a listing photo into the per-process photos directory and
/// return its local path. The file name is taken from the URL path.
pub(crate) async fn download_photo(http: &Client, photo_url: &str) -> Result<PathBuf> {
    let response = http.get(photo_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WatcherError::Status {
            url: photo_url.to_string(),
            status,
        });
    }
    let bytes = response.bytes().await?;

    let dir = std::env::temp_dir().join("fleamarket-watcher-photos");
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = photo_url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("photo")
        .split('?')
        .next()
        .unwrap_or("photo");
    let path = dir.join(file_name);
    tokio::fs::write(&path, &bytes).await?;
    debug!("downloaded photo to {}", path.display());
    Ok(path)
}

/// Strip trailing query parameters (referral tags) so the same listing is
/// never counted twice under different refs.
pub(crate) fn strip_referral(href: &str) -> &str {
    href.split('?').next().unwrap_or(href)
}

/// Content of the first `<meta>` tag matching `attr="name"`.
pub(crate) fn meta_content(doc: &scraper::Html, attr: &str, name: &str) -> Option<String> {
    let selector = scraper::Selector::parse(&format!(r#"meta[{attr}="{name}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
}
