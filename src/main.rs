//! Marketplace listing monitor
//!
//! Polls second-hand marketplaces for new listings matching keyword/price
//! filters and notifies via email and Telegram.

use clap::{Parser, Subcommand, ValueEnum};
use fleamarket_watcher::{
    config::{parse_filters, Config, Filter},
    notify::{Alert, AlertFanout, EmailNotifier, PushNotifier},
    source::{Mercari, Rakuma, Source},
    supervisor,
    types::ItemRef,
    walker::Walker,
    watch::MonitorSettings,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fleamarket-watcher")]
#[command(about = "Get notified when new marketplace listings match your searches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Marketplace {
    Mercari,
    Rakuma,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor keywords and notify on new listings
    Run {
        /// Keywords separated by a comma
        #[arg(long)]
        keywords: String,
        /// Minimum price per keyword, comma separated (empty slot = no bound)
        #[arg(long)]
        min_prices: Option<String>,
        /// Maximum price per keyword, comma separated (empty slot = no bound)
        #[arg(long)]
        max_prices: Option<String>,
        /// Marketplace to poll
        #[arg(long, value_enum, default_value = "mercari")]
        source: Marketplace,
        /// Disable the email channel
        #[arg(long)]
        no_email: bool,
        /// Disable the Telegram channel
        #[arg(long)]
        no_push: bool,
    },
    /// One-shot search sweep, printing the matching listing URLs
    Search {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        min_price: Option<u32>,
        #[arg(long)]
        max_price: Option<u32>,
        /// Cap on items to collect
        #[arg(long, default_value = "100")]
        max_items: usize,
        #[arg(long, value_enum, default_value = "mercari")]
        source: Marketplace,
    },
    /// Fetch and print one listing
    Details {
        /// Listing URL
        url: String,
        #[arg(long, value_enum, default_value = "mercari")]
        source: Marketplace,
    },
    /// Send a probe alert through every configured channel
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run {
            keywords,
            min_prices,
            max_prices,
            source,
            no_email,
            no_push,
        } => {
            run(
                config,
                &keywords,
                min_prices.as_deref(),
                max_prices.as_deref(),
                source,
                no_email,
                no_push,
            )
            .await
        }
        Commands::Search {
            keyword,
            min_price,
            max_price,
            max_items,
            source,
        } => search(config, &keyword, min_price, max_price, max_items, source).await,
        Commands::Details { url, source } => details(config, &url, source).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

fn build_source(marketplace: Marketplace, config: &Config) -> anyhow::Result<Arc<dyn Source>> {
    let timeout = Duration::from_secs(config.watcher.request_timeout_secs);
    Ok(match marketplace {
        Marketplace::Mercari => Arc::new(Mercari::new(timeout)?),
        Marketplace::Rakuma => Arc::new(Rakuma::new(timeout)?),
    })
}

fn build_fanout(config: &Config, no_email: bool, no_push: bool) -> anyhow::Result<AlertFanout> {
    let mut fanout = AlertFanout::new();

    match (&config.email, no_email) {
        (Some(email), false) => fanout.add(Box::new(EmailNotifier::new(email)?)),
        (Some(_), true) => tracing::info!("email channel disabled by flag"),
        (None, _) => tracing::warn!(
            "email is not configured; add an [email] section to receive email notifications"
        ),
    }

    match (&config.telegram, no_push) {
        (Some(telegram), false) => fanout.add(Box::new(PushNotifier::new(telegram))),
        (Some(_), true) => tracing::info!("telegram channel disabled by flag"),
        (None, _) => tracing::warn!(
            "telegram is not configured; add a [telegram] section to receive push notifications"
        ),
    }

    Ok(fanout)
}

async fn run(
    config: Config,
    keywords: &str,
    min_prices: Option<&str>,
    max_prices: Option<&str>,
    marketplace: Marketplace,
    no_email: bool,
    no_push: bool,
) -> anyhow::Result<()> {
    // Fail fast on bad filters or credentials, before any monitor starts.
    let filters = parse_filters(keywords, min_prices, max_prices)?;
    let fanout = Arc::new(build_fanout(&config, no_email, no_push)?);
    let source = build_source(marketplace, &config)?;

    let settings = MonitorSettings {
        poll_interval: Duration::from_secs(config.watcher.poll_interval_secs),
        page_delay: Duration::from_secs(config.watcher.page_delay_secs),
        max_items: Some(config.watcher.max_items),
    };

    tracing::info!(
        "starting {} keyword monitor(s) on {}",
        filters.len(),
        source.name()
    );
    supervisor::run_monitors(filters, source, fanout, settings).await;
    Ok(())
}

async fn search(
    config: Config,
    keyword: &str,
    min_price: Option<u32>,
    max_price: Option<u32>,
    max_items: usize,
    marketplace: Marketplace,
) -> anyhow::Result<()> {
    let filter = Filter::new(keyword, min_price, max_price)?;
    let source = build_source(marketplace, &config)?;
    let walker = Walker {
        page_delay: Duration::from_secs(config.watcher.page_delay_secs),
        ..Walker::default()
    };

    let items = walker
        .fetch_all(source.as_ref(), &filter, Some(max_items))
        .await?;
    for item in &items {
        println!("{item}");
    }
    tracing::info!("found {} listings for '{}'", items.len(), filter.keyword);
    Ok(())
}

async fn details(config: Config, url: &str, marketplace: Marketplace) -> anyhow::Result<()> {
    let source = build_source(marketplace, &config)?;
    let item = source.item_details(&ItemRef::new(url)).await?;

    println!("name:        {}", item.name);
    println!("price:       {}", item.price);
    println!("condition:   {}", item.condition.as_deref().unwrap_or("-"));
    println!("in stock:    {}", item.in_stock);
    println!("photo:       {}", item.photo_url);
    if let Some(local) = &item.photo_local {
        println!("local photo: {}", local.display());
    }
    println!("{}", item.description);
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let fanout = build_fanout(&config, false, false)?;
    anyhow::ensure!(
        !fanout.is_empty(),
        "no notification channels configured; add [email] or [telegram] to the config file"
    );

    let alert = Alert {
        subject: "fleamarket-watcher test".to_string(),
        body: "Notification channels are working.".to_string(),
        url: String::new(),
        photo: None,
    };
    anyhow::ensure!(
        fanout.dispatch(&alert).await,
        "every notification channel failed"
    );
    println!("test alert delivered");
    Ok(())
}
