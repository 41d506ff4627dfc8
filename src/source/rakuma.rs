//! Rakuma (fril.jp) adapter

use super::{build_client, download_photo, fetch_text, meta_content, strip_referral, Source};
use crate::config::Filter;
use crate::error::{Result, WatcherError};
use crate::types::{Item, ItemRef, ListingPage};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const SEARCH_URL: &str = "https://fril.jp/s";

pub struct Rakuma {
    http: Client,
}

impl Rakuma {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
        })
    }

    // https://fril.jp/s?max=30000&min=10000&order=desc&page=2&query=clothes&sort=relevance
    fn search_url(&self, filter: &Filter, page: u32) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("query", filter.keyword.clone()),
            ("order", "desc".to_string()),
            ("sort", "relevance".to_string()),
        ];
        if let Some(min) = filter.price_min {
            params.push(("min", min.to_string()));
        }
        if let Some(max) = filter.price_max {
            params.push(("max", max.to_string()));
        }
        // Page one is the bare search URL.
        if page >= 2 {
            params.push(("page", page.to_string()));
        }
        Url::parse_with_params(SEARCH_URL, &params)
            .expect("static search url")
            .into()
    }
}

#[async_trait]
impl Source for Rakuma {
    fn name(&self) -> &'static str {
        "rakuma"
    }

    fn first_page(&self) -> u32 {
        1
    }

    async fn list_page(&self, filter: &Filter, page: u32) -> Result<ListingPage> {
        let html = fetch_text(&self.http, &self.search_url(filter, page)).await?;
        Ok(parse_listing(&html))
    }

    async fn item_details(&self, item: &ItemRef) -> Result<Item> {
        let html = fetch_text(&self.http, item.as_str()).await?;
        let mut details = parse_details(&html, item)?;
        match download_photo(&self.http, &details.photo_url).await {
            Ok(path) => details.photo_local = Some(path),
            Err(e) => warn!("photo download failed for {item}: {e}"),
        }
        Ok(details)
    }
}

fn parse_listing(html: &str) -> ListingPage {
    let doc = Html::parse_document(html);
    let wrapper = Selector::parse("div.item-box__image-wrapper").expect("static selector");
    let anchor = Selector::parse("a").expect("static selector");

    let items = doc
        .select(&wrapper)
        .filter_map(|w| w.select(&anchor).next())
        .filter_map(|a| a.value().attr("href"))
        .map(|href| ItemRef::new(strip_referral(href)))
        .collect();

    // Fril exposes no total-count marker; the walker stops on the first
    // empty page instead.
    ListingPage {
        items,
        has_more: None,
    }
}

fn parse_details(html: &str, url: &ItemRef) -> Result<Item> {
    let doc = Html::parse_document(html);

    let extract = |what| WatcherError::Extract {
        what,
        url: url.to_string(),
    };

    // og:title carries a "name | shop" suffix.
    let name = meta_content(&doc, "property", "og:title")
        .ok_or_else(|| extract("og:title"))?
        .split('|')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let price_raw = meta_content(&doc, "property", "product:price:amount")
        .ok_or_else(|| extract("price"))?;
    let price = Decimal::from_str(price_raw.trim()).map_err(|_| extract("price"))?;
    let description = meta_content(&doc, "property", "og:description").unwrap_or_default();
    let in_stock = meta_content(&doc, "property", "product:availability")
        .map(|a| !a.contains("out"))
        .unwrap_or(false);
    let photo_url = meta_content(&doc, "property", "og:image").ok_or_else(|| extract("og:image"))?;

    Ok(Item {
        name,
        price,
        description,
        condition: None,
        is_new: false,
        in_stock,
        photo_url,
        photo_local: None,
        url: url.clone(),
        discovered_at: Utc::now(),
    })
}
