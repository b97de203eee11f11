// src/metrics.rs
use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_cycles_total", "Sync cycles started.");
        describe_counter!(
            "relay_feed_errors_total",
            "Cycles aborted because the feed was unavailable."
        );
        describe_counter!("relay_entries_seen_total", "Entries decoded from the feed.");
        describe_counter!(
            "relay_entries_qualifying_total",
            "Comment entries newer than the anchor."
        );
        describe_counter!("relay_dispatched_total", "Notifications accepted by the sink.");
        describe_counter!(
            "relay_dispatch_failures_total",
            "Notifications the sink did not accept."
        );
        describe_counter!(
            "relay_entry_decode_degraded_total",
            "Entries whose timestamp fell back to the epoch."
        );
        describe_histogram!("relay_cycle_ms", "Full cycle time in milliseconds.");
        describe_histogram!("relay_fetch_ms", "Feed fetch time in milliseconds.");
        describe_gauge!("relay_anchor_ts", "Unix ts of the current sync anchor.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Only one recorder may exist per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }

    /// Bind and serve the router on a background task.
    pub async fn serve(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let router = self.router();
        tracing::info!(%addr, "metrics endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::warn!(error = %e, "metrics server stopped");
            }
        });
        Ok(())
    }
}
