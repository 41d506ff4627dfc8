//! Mercari (mercari.com) adapter

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

const SEARCH_URL: &str = "https://www.mercari.com/jp/search/";
const ITEM_HOST: &str = "https://www.mercari.com";

pub struct Mercari {
    http: Client,
}

impl Mercari {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
        })
    }

    fn search_url(&self, filter: &Filter, page: u32) -> String {
        // Empty sort_order selects the site default (newest first), which
        // first-page delta detection relies on.
        let mut params: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("keyword", filter.keyword.clone()),
            ("sort_order", String::new()),
        ];
        if let Some(min) = filter.price_min {
            params.push(("price_min", min.to_string()));
        }
        if let Some(max) = filter.price_max {
            params.push(("price_max", max.to_string()));
        }
        Url::parse_with_params(SEARCH_URL, &params)
            .expect("static search url")
            .into()
    }
}

#[async_trait]
impl Source for Mercari {
    fn name(&self) -> &'static str {
        "mercari"
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
    let section = Selector::parse("section.items-box").expect("static selector");
    let anchor = Selector::parse("a").expect("static selector");

    let items = doc
        .select(&section)
        .filter_map(|s| s.select(&anchor).next())
        .filter_map(|a| a.value().attr("href"))
        .map(|href| ItemRef::new(absolutize(strip_referral(href))))
        .collect();

    // The result-head counter doubles as the end-of-results marker: absent,
    // or counting zero hits, means there is nothing past this page.
    let head = Selector::parse("h2.search-result-head").expect("static selector");
    let has_more = match doc.select(&head).next() {
        None => Some(false),
        Some(head) => {
            let text: String = head.text().collect();
            match first_digit_run(&text) {
                Some(count) => Some(count != "0"),
                None => Some(true),
            }
        }
    };

    ListingPage { items, has_more }
}

fn parse_details(html: &str, url: &ItemRef) -> Result<Item> {
    let doc = Html::parse_document(html);

    let extract = |what| WatcherError::Extract {
        what,
        url: url.to_string(),
    };

    let name = meta_content(&doc, "property", "og:title").ok_or_else(|| extract("og:title"))?;
    let price_raw = meta_content(&doc, "property", "product:price:amount")
        .ok_or_else(|| extract("price"))?;
    let price = Decimal::from_str(price_raw.trim()).map_err(|_| extract("price"))?;
    let description = meta_content(&doc, "property", "og:description").unwrap_or_default();
    let condition = meta_content(&doc, "itemprop", "itemCondition");
    let is_new = condition
        .as_deref()
        .map(|c| c.eq_ignore_ascii_case("new"))
        .unwrap_or(false);
    let in_stock = meta_content(&doc, "property", "og:availability")
        .map(|a| a.contains("instock"))
        .unwrap_or(false);
    let photo_url = meta_content(&doc, "property", "og:image").ok_or_else(|| extract("og:image"))?;

    Ok(Item {
        name,
        price,
        description,
        condition,
        is_new,
        in_stock,
        photo_url,
        photo_local: None,
        url: url.clone(),
        discovered_at: Utc::now(),
    })
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{ITEM_HOST}{href}")
    }
}

fn first_digit_run(text: &str) -> Option<String> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    Some(
        text[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const LISTING_PAGE: &str = r#"
        <html><body>
        <h2 class="search-result-head">検索結果 123件</h2>
        <section class="items-box">
          <a href="/jp/items/m111/?ref=search_results"><img src="x.jpg"></a>
        </section>
        <section class="items-box">
          <a href="https://item.mercari.com/jp/m222/">item</a>
        </section>
        </body></html>"#;

    #[test]
    fn extracts_refs_and_strips_referral_tags() {
        let page = parse_listing(LISTING_PAGE);
        assert_eq!(
            page.items,
            vec![
                ItemRef::new("https://www.mercari.com/jp/items/m111/"),
                ItemRef::new("https://item.mercari.com/jp/m222/"),
            ]
        );
        assert_eq!(page.has_more, Some(true));
    }

    #[test]
    fn zero_result_marker_means_no_more_pages() {
        let html = r#"<h2 class="search-result-head">検索結果 0件</h2>"#;
        let page = parse_listing(html);
        assert!(page.items.is_empty());
        assert_eq!(page.has_more, Some(false));
    }

    #[test]
    fn missing_marker_means_no_more_pages() {
        let page = parse_listing("<html><body></body></html>");
        assert!(page.items.is_empty());
        assert_eq!(page.has_more, Some(false));
    }

    const ITEM_PAGE: &str = r#"
        <html><head>
        <meta property="og:title" content="Vintage road bike">
        <meta property="og:description" content="Well kept, small scratches.">
        <meta property="product:price:amount" content="25000">
        <meta itemprop="itemCondition" content="New">
        <meta property="og:availability" content="instock">
        <meta property="og:image" content="https://static.mercdn.net/item/detail/m111_1.jpg">
        </head></html>"#;

    #[test]
    fn extracts_item_details_from_meta_tags() {
        let url = ItemRef::new("https://www.mercari.com/jp/items/m111/");
        let item = parse_details(ITEM_PAGE, &url).unwrap();
        assert_eq!(item.name, "Vintage road bike");
        assert_eq!(item.price, Decimal::from(25000));
        assert_eq!(item.description, "Well kept, small scratches.");
        assert_eq!(item.condition.as_deref(), Some("New"));
        assert!(item.is_new);
        assert!(item.in_stock);
        assert_eq!(
            item.photo_url,
            "https://static.mercdn.net/item/detail/m111_1.jpg"
        );
        assert!(item.photo_local.is_none());
        assert_eq!(item.url, url);
    }

    #[test]
    fn missing_title_is_an_extraction_error() {
        let url = ItemRef::new("https://www.mercari.com/jp/items/m111/");
        let err = parse_details("<html></html>", &url).unwrap_err();
        assert!(matches!(err, WatcherError::Extract { .. }));
    }

    #[test]
    fn search_url_includes_price_bounds_only_when_set() {
        let source = Mercari::new(Duration::from_secs(20)).unwrap();

        let open = Filter::new("bike", None, None).unwrap();
        let url = source.search_url(&open, 0);
        assert!(url.contains("keyword=bike"));
        assert!(url.contains("page=0"));
        assert!(!url.contains("price_min"));
        assert!(!url.contains("price_max"));

        let bounded = Filter::new("bike", Some(1000), Some(5000)).unwrap();
        let url = source.search_url(&bounded, 2);
        assert!(url.contains("price_min=1000"));
        assert!(url.contains("price_max=5000"));
        assert!(url.contains("page=2"));
    }
}
