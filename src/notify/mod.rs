//! Notification channels
//!
//! Delivery is best-effort: a channel that fails is logged and skipped,
//! never surfaced to the polling core.

mod email;
mod push;

pub use email::EmailNotifier;
pub use push::PushNotifier;

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// One formatted new-listing alert.
#[derive(Debug, Clone)]
pub struct Alert {
    pub subject: String,
    pub body: String,
    pub url: String,
    /// Local path of the downloaded listing photo, when available.
    pub photo: Option<PathBuf>,
}

/// A delivery channel for alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Fans one alert out to every configured channel.
#[derive(Default)]
pub struct AlertFanout {
    channels: Vec<Box<dyn Notifier>>,
}

impl AlertFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `alert` on every channel; returns whether at least one
    /// delivery succeeded. Individual failures are logged, not raised.
    pub async fn dispatch(&self, alert: &Alert) -> bool {
        if self.channels.is_empty() {
            info!("no notification channels configured, skipping '{}'", alert.subject);
            return false;
        }

        let mut delivered = false;
        for channel in &self.channels {
            match channel.notify(alert).await {
                Ok(()) => {
                    info!("sent '{}' via {}", alert.subject, channel.name());
                    delivered = true;
                }
                Err(e) => {
                    warn!("{} notification failed: {e}", channel.name());
                }
            }
        }
        delivered
    }
}
