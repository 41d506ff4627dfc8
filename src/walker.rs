//! Pagination walker: sweeps a search across successive result pages

use crate::config::Filter;
use crate::error::Result;
use crate::source::Source;
use crate::types::ItemRef;
use std::time::Duration;
use tracing::{debug, warn};

/// Walks search result pages until the source runs out, a cap is exceeded,
/// or the defensive page ceiling is hit.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Courtesy delay between consecutive page requests.
    pub page_delay: Duration,
    /// Upper bound on pages walked in one sweep.
    pub page_ceiling: u32,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(2),
            page_ceiling: 500,
        }
    }
}

impl Walker {
    /// Accumulate listing refs across pages, preserving source order.
    ///
    /// `max_items` is a soft cap: the walk stops once the accumulated count
    /// exceeds it, without truncating the overshooting page. Retrieval
    /// failures propagate to the caller; the walker never retries.
    pub async fn fetch_all(
        &self,
        source: &dyn Source,
        filter: &Filter,
        max_items: Option<usize>,
    ) -> Result<Vec<ItemRef>> {
        let mut collected = Vec::new();
        let first = source.first_page();
        let mut page = first;

        loop {
            let result = source.list_page(filter, page).await?;
            let end_of_results = result.has_more == Some(false);
            let page_was_empty = result.items.is_empty();
            collected.extend(result.items);
            debug!("[{}] found {} items so far", filter.keyword, collected.len());

            if end_of_results || page_was_empty {
                break;
            }
            if let Some(max) = max_items {
                if collected.len() > max {
                    debug!(
                        "[{}] reached the maximum items to fetch: {max}",
                        filter.keyword
                    );
                    break;
                }
            }
            if page - first + 1 >= self.page_ceiling {
                warn!(
                    "[{}] giving up the sweep at the page ceiling ({})",
                    filter.keyword, self.page_ceiling
                );
                break;
            }

            tokio::time::sleep(self.page_delay).await;
            page += 1;
        }

        debug!("[{}] no more items to fetch", filter.keyword);
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatcherError;
    use crate::types::{Item, ListingPage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Scripted {
        Page(ListingPage),
        Fail,
    }

    /// Serves a fixed page script; anything past the script is an empty page.
    struct StubSource {
        first: u32,
        script: Vec<Scripted>,
        requested: Mutex<Vec<u32>>,
    }

    impl StubSource {
        fn new(first: u32, script: Vec<Scripted>) -> Self {
            Self {
                first,
                script,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Source for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn first_page(&self) -> u32 {
            self.first
        }

        async fn list_page(&self, _filter: &Filter, page: u32) -> Result<ListingPage> {
            self.requested.lock().unwrap().push(page);
            match self.script.get((page - self.first) as usize) {
                Some(Scripted::Page(page)) => Ok(page.clone()),
                Some(Scripted::Fail) => Err(WatcherError::Status {
                    url: "http://stub".into(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                }),
                None => Ok(ListingPage::default()),
            }
        }

        async fn item_details(&self, item: &crate::types::ItemRef) -> Result<Item> {
            Err(WatcherError::Extract {
                what: "details",
                url: item.to_string(),
            })
        }
    }

    fn refs(urls: &[&str]) -> Vec<ItemRef> {
        urls.iter().map(|url| ItemRef::new(*url)).collect()
    }

    fn page(urls: &[&str], has_more: Option<bool>) -> Scripted {
        Scripted::Page(ListingPage {
            items: refs(urls),
            has_more,
        })
    }

    fn walker() -> Walker {
        Walker {
            page_delay: Duration::ZERO,
            ..Walker::default()
        }
    }

    fn filter() -> Filter {
        Filter::new("bike", None, None).unwrap()
    }

    #[tokio::test]
    async fn concatenates_pages_until_the_first_empty_one() {
        let source = StubSource::new(
            0,
            vec![page(&["a", "b"], None), page(&["c"], None)],
        );

        let items = walker().fetch_all(&source, &filter(), None).await.unwrap();
        assert_eq!(items, refs(&["a", "b", "c"]));
        assert_eq!(source.requested(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stops_at_the_explicit_end_marker() {
        let source = StubSource::new(
            0,
            vec![page(&["a", "b"], Some(false)), page(&["never"], None)],
        );

        let items = walker().fetch_all(&source, &filter(), None).await.unwrap();
        assert_eq!(items, refs(&["a", "b"]));
        assert_eq!(source.requested(), vec![0]);
    }

    #[tokio::test]
    async fn stops_once_the_cap_is_exceeded_without_truncating() {
        let source = StubSource::new(
            0,
            vec![
                page(&["a", "b"], Some(true)),
                page(&["c", "d"], Some(true)),
                page(&["e", "f"], Some(true)),
            ],
        );

        let items = walker()
            .fetch_all(&source, &filter(), Some(3))
            .await
            .unwrap();
        // Overshoot past the page boundary is kept.
        assert_eq!(items, refs(&["a", "b", "c", "d"]));
        assert_eq!(source.requested(), vec![0, 1]);
    }

    #[tokio::test]
    async fn cap_equal_to_count_keeps_walking() {
        let source = StubSource::new(0, vec![page(&["a", "b"], Some(true))]);

        let items = walker()
            .fetch_all(&source, &filter(), Some(2))
            .await
            .unwrap();
        // Two collected does not exceed a cap of two; the next (empty)
        // page terminates the walk instead.
        assert_eq!(items, refs(&["a", "b"]));
        assert_eq!(source.requested(), vec![0, 1]);
    }

    #[tokio::test]
    async fn page_ceiling_bounds_a_source_that_never_ends() {
        let endless: Vec<Scripted> = (0..10)
            .map(|i| page(&[format!("item{i}").as_str()], Some(true)))
            .collect();
        let source = StubSource::new(0, endless);

        let items = Walker {
            page_delay: Duration::ZERO,
            page_ceiling: 3,
        }
        .fetch_all(&source, &filter(), None)
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(source.requested(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn retrieval_failure_propagates_to_the_caller() {
        let source = StubSource::new(0, vec![page(&["a"], Some(true)), Scripted::Fail]);

        let err = walker()
            .fetch_all(&source, &filter(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WatcherError::Status { .. }));
    }

    #[tokio::test]
    async fn respects_a_source_whose_pages_start_at_one() {
        let source = StubSource::new(1, vec![page(&["a"], None)]);

        let items = walker().fetch_all(&source, &filter(), None).await.unwrap();
        assert_eq!(items, refs(&["a"]));
        assert_eq!(source.requested(), vec![1, 2]);
    }
}
