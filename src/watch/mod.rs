//! Per-keyword monitoring state machine


use crate::config::Filter;
use crate::delta::{find_new, SeenItems};
use crate::error::Result;
use crate::notify::{Alert, AlertFanout};
use crate::source::Source;
use crate::types::Item;
use crate::walker::Walker;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Settings shared by every monitor.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Courtesy delay between pages of the initial sweep.
    pub page_delay: Duration,
    /// Cap on items accumulated by the initial sweep.
    pub max_items: Option<usize>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            page_delay: Duration::from_secs(2),
            max_items: Some(100),
        }
    }
}

/// Watches one keyword/price filter for newly appearing listings.
///
/// Lifecycle: an initial full sweep seeds the identity set (nothing in the
/// snapshot is notified), then the monitor polls the first results page
/// forever, notifying each listing the moment it first shows up. New
/// listings are assumed to surface at the head of the source's default
/// ordering, so each cycle costs exactly one page request.
pub struct KeywordMonitor {
    source: Arc<dyn Source>,
    notifier: Arc<AlertFanout>,
    filter: Filter,
    walker: Walker,
    poll_interval: Duration,
    max_items: Option<usize>,
    seen: SeenItems,
}

impl KeywordMonitor {
    pub fn new(
        source: Arc<dyn Source>,
        notifier: Arc<AlertFanout>,
        filter: Filter,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            filter,
            walker: Walker {
                page_delay: settings.page_delay,
                ..Walker::default()
            },
            poll_interval: settings.poll_interval,
            max_items: settings.max_items,
            seen: SeenItems::new(),
        }
    }

    /// Run until the process dies. Never returns in normal operation.
    pub async fn run(mut self) {
        info!(
            "[{}] starting monitor with price_min = {:?} and price_max = {:?}",
            self.filter.keyword, self.filter.price_min, self.filter.price_max
        );

        loop {
            match self.initialize().await {
                Ok(count) => {
                    info!("[{}] seeded with {count} current listings", self.filter.keyword);
                    break;
                }
                Err(e) => {
                    warn!(
                        "[{}] initial sweep failed: {e}, retrying after pause",
                        self.filter.keyword
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        loop {
            tokio::time::sleep(self.poll_interval).await;
            if let Err(e) = self.poll_once().await {
                // One bad round trip skips the cycle, never the monitor.
                warn!("[{}] poll cycle failed: {e}", self.filter.keyword);
            }
        }
    }

    /// One full sweep seeding the identity set with the current snapshot.
    async fn initialize(&mut self) -> Result<usize> {
        let snapshot = self
            .walker
            .fetch_all(self.source.as_ref(), &self.filter, self.max_items)
            .await?;
        for item in &snapshot {
            info!("[{}] CURRENT = {item}", self.filter.keyword);
        }
        let count = snapshot.len();
        self.seen = SeenItems::seed(snapshot);
        Ok(count)
    }

    /// One steady-state cycle: diff the first page, notify new listings.
    async fn poll_once(&mut self) -> Result<()> {
        info!(
            "[{}] fetching the first page to check new results",
            self.filter.keyword
        );
        let page = self
            .source
            .list_page(&self.filter, self.source.first_page())
            .await?;

        for item_ref in find_new(&page.items, &self.seen) {
            info!("[{}] NEW = {item_ref}", self.filter.keyword);
            // Inserted before the detail fetch: a listing that fails below
            // is never notified, but also never notified twice.
            self.seen.insert(item_ref.clone());

            match self.source.item_details(&item_ref).await {
                Ok(item) => {
                    self.notifier.dispatch(&alert_for(&item)).await;
                }
                Err(e) => {
                    warn!(
                        "[{}] detail fetch failed for {item_ref}: {e}",
                        self.filter.keyword
                    );
                }
            }
        }
        Ok(())
    }
}

fn alert_for(item: &Item) -> Alert {
    Alert {
        subject: format!("{} {}", item.name, item.price),
        body: format!("{}\n\n{}", item.url, item.description),
        url: item.url.to_string(),
        photo: item.photo_local.clone(),
    }
}
