//! comment-relay — binary entrypoint.
//! Loads config, wires the feed source and dispatcher, then polls until killed.
//!
//! Sync state is in memory only: a restart replays everything the feed page
//! still shows since the backfill anchor, so duplicates after a restart are
//! expected.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use comment_relay::config::{FeedSettings, RelayConfig, SinkSettings};
use comment_relay::feed::fetcher::{FixtureFeedSource, HttpFeedSource};
use comment_relay::feed::FeedSource;
use comment_relay::metrics::Metrics;
use comment_relay::notify::{Dispatcher, DryRunDispatcher, SlackDispatcher};
use comment_relay::sync::scheduler::{run_cycles, run_forever};

/// Compact logs by default, JSON with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("comment_relay=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn build_source(cfg: &RelayConfig) -> Result<Box<dyn FeedSource>> {
    Ok(match &cfg.feed {
        FeedSettings::Http {
            base_url,
            username,
            password,
        } => Box::new(
            HttpFeedSource::new(
                base_url,
                username.as_str(),
                password.as_str(),
                cfg.max_items,
                cfg.fetch_timeout,
            )
            .context("building feed http client")?,
        ),
        FeedSettings::Fixture(path) => {
            let xml = std::fs::read_to_string(path)
                .with_context(|| format!("reading feed fixture {}", path.display()))?;
            Box::new(FixtureFeedSource::from_fixture(&xml))
        }
    })
}

fn build_dispatcher(cfg: &RelayConfig) -> Result<Box<dyn Dispatcher>> {
    Ok(match &cfg.sink {
        SinkSettings::Webhook(url) => Box::new(
            SlackDispatcher::new(url.as_str(), cfg.dispatch_timeout)
                .context("building webhook http client")?,
        ),
        SinkSettings::DryRun => Box::new(DryRunDispatcher),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let once = std::env::args().skip(1).any(|a| a == "--once");

    let cfg = RelayConfig::from_env().context("loading configuration")?;
    tracing::info!(config = ?cfg, "configuration loaded");

    let source = build_source(&cfg)?;
    let dispatcher = build_dispatcher(&cfg)?;

    // Keep the handle alive for the life of the process.
    let _metrics = match cfg.metrics_addr {
        Some(addr) => {
            let m = Metrics::init()?;
            m.serve(addr).await.context("starting metrics endpoint")?;
            Some(m)
        }
        None => None,
    };

    if once {
        let anchor = run_cycles(
            source.as_ref(),
            dispatcher.as_ref(),
            cfg.scheduler(),
            Some(1),
        )
        .await;
        tracing::info!(%anchor, "single cycle finished");
        return Ok(());
    }

    run_forever(source.as_ref(), dispatcher.as_ref(), cfg.scheduler()).await;
    Ok(())
}
