//! Monitor supervision: one concurrent task per keyword filter

use crate::config::Filter;
use crate::notify::AlertFanout;
use crate::source::Source;
use crate::watch::{KeywordMonitor, MonitorSettings};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Delay between monitor starts, so the initial sweeps do not all hit the
/// source at the same moment.
const START_STAGGER: Duration = Duration::from_secs(5);

/// Spawn one monitor per filter and block for the process lifetime.
///
/// Monitors are isolated failure domains: a task that dies is logged and
/// leaves its siblings running.
pub async fn run_monitors(
    filters: Vec<Filter>,
    source: Arc<dyn Source>,
    notifier: Arc<AlertFanout>,
    settings: MonitorSettings,
) {
    let count = filters.len();
    let mut handles = Vec::with_capacity(count);

    for (i, filter) in filters.into_iter().enumerate() {
        info!("[{}] spawning monitor ({}/{count})", filter.keyword, i + 1);
        let monitor = KeywordMonitor::new(
            source.clone(),
            notifier.clone(),
            filter,
            settings.clone(),
        );
        handles.push(tokio::spawn(monitor.run()));

        if i + 1 < count {
            tokio::time::sleep(START_STAGGER).await;
        }
    }

    // Monitors run until the process is killed; a handle resolving at all
    // means that task died.
    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("monitor task terminated abnormally: {e}");
        }
    }
}
