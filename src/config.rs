//! Configuration loading and search filter validation

use crate::error::{Result, WatcherError};
use serde::Deserialize;

/// Top-level configuration, loaded from a TOML file with environment
/// variable overrides (prefix `WATCHER_`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watcher: WatcherConfig,
    pub email: Option<EmailConfig>,
    pub telegram: Option<TelegramConfig>,
}

/// Polling tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between poll cycles of one keyword monitor.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Courtesy delay between successive page requests during a sweep.
    #[serde(default = "default_page_delay")]
    pub page_delay_secs: u64,
    /// Cap on items accumulated by the initial sweep.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Timeout applied to every outbound HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_page_delay() -> u64 {
    2
}

fn default_max_items() -> usize {
    100
}

fn default_request_timeout() -> u64 {
    20
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            page_delay_secs: default_page_delay(),
            max_items: default_max_items(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// SMTP email channel credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_password: String,
    /// Address used in the From header.
    pub sender: String,
    pub recipients: Vec<String>,
}

/// Telegram push channel credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    /// Load configuration from a TOML file, overlaid with `WATCHER_*`
    /// environment variables. A missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        let path = shellexpand::tilde(path);

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("WATCHER").separator("__"))
            .build()
            .map_err(|e| WatcherError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| WatcherError::Config(e.to_string()))
    }
}

/// One monitored search: a keyword plus optional price bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub keyword: String,
    pub price_min: Option<u32>,
    pub price_max: Option<u32>,
}

impl Filter {
    /// Validates the filter. A monitor is never constructed from an
    /// unvalidated one.
    pub fn new(
        keyword: impl Into<String>,
        price_min: Option<u32>,
        price_max: Option<u32>,
    ) -> Result<Self> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(WatcherError::Config("keyword must not be empty".into()));
        }
        if let (Some(min), Some(max)) = (price_min, price_max) {
            if min >= max {
                return Err(WatcherError::Config(format!(
                    "price_min ({min}) must be below price_max ({max}) for '{keyword}'"
                )));
            }
        }
        Ok(Self {
            keyword,
            price_min,
            price_max,
        })
    }
}

/// Zip comma-separated keyword and price lists into filters.
///
/// The price lists are positional: element N bounds keyword N. An empty
/// element means "no bound". A provided list whose length differs from the
/// keyword list is rejected.
pub fn parse_filters(
    keywords: &str,
    min_prices: Option<&str>,
    max_prices: Option<&str>,
) -> Result<Vec<Filter>> {
    let keywords: Vec<&str> = keywords.split(',').map(str::trim).collect();

    let mins = parse_price_list(min_prices, keywords.len(), "min-prices")?;
    let maxs = parse_price_list(max_prices, keywords.len(), "max-prices")?;

    keywords
        .into_iter()
        .zip(mins)
        .zip(maxs)
        .map(|((keyword, min), max)| Filter::new(keyword, min, max))
        .collect()
}

fn parse_price_list(
    list: Option<&str>,
    expected_len: usize,
    label: &str,
) -> Result<Vec<Option<u32>>> {
    let Some(list) = list else {
        return Ok(vec![None; expected_len]);
    };

    let parsed: Vec<Option<u32>> = list
        .split(',')
        .map(str::trim)
        .map(|v| {
            if v.is_empty() {
                Ok(None)
            } else {
                v.parse::<u32>()
                    .map(Some)
                    .map_err(|_| WatcherError::Config(format!("invalid price '{v}' in {label}")))
            }
        })
        .collect::<Result<_>>()?;

    if parsed.len() != expected_len {
        return Err(WatcherError::Config(format!(
            "{label} has {} entries but {expected_len} keywords were given",
            parsed.len()
        )));
    }
    Ok(parsed)
}
