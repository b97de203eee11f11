// src/sync/mod.rs
//! One fetch → filter → sanitize → dispatch pass.
//!
//! The anchor is passed in and handed back; nothing here keeps state between
//! cycles. The returned anchor is the cycle's start time whether or not the
//! fetch worked, so an outage leaves a gap instead of a replay burst.

pub mod scheduler;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};

use crate::error::FeedError;
use crate::feed::{Entry, FeedSource};
use crate::metrics::ensure_metrics_described;
use crate::notify::Dispatcher;
use crate::sanitize::sanitize;

/// Per-cycle counts, mostly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub entries_seen: usize,
    pub qualifying: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct CycleOutcome {
    pub next_anchor: DateTime<Utc>,
    /// Set when the feed could not be fetched or decoded.
    pub error: Option<FeedError>,
    pub stats: CycleStats,
}

/// A comment updated strictly after the anchor.
pub fn qualifies(entry: &Entry, anchor: DateTime<Utc>) -> bool {
    entry.is_comment() && entry.updated_at > anchor
}

/// Run one cycle starting now.
pub async fn run_cycle(
    source: &dyn FeedSource,
    dispatcher: &dyn Dispatcher,
    anchor: DateTime<Utc>,
) -> CycleOutcome {
    run_cycle_at(source, dispatcher, anchor, Utc::now()).await
}

/// Run one cycle with an explicit start time, which becomes the next anchor.
pub async fn run_cycle_at(
    source: &dyn FeedSource,
    dispatcher: &dyn Dispatcher,
    anchor: DateTime<Utc>,
    cycle_start: DateTime<Utc>,
) -> CycleOutcome {
    ensure_metrics_described();
    counter!("relay_cycles_total").increment(1);
    let t0 = std::time::Instant::now();

    tracing::info!(%anchor, source = source.name(), "syncing comments");

    let snapshot = match source.fetch_snapshot().await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(
                error = %e,
                kind = e.kind(),
                source = source.name(),
                "feed unavailable, skipping cycle"
            );
            counter!("relay_feed_errors_total").increment(1);
            return CycleOutcome {
                next_anchor: cycle_start,
                error: Some(e),
                stats: CycleStats::default(),
            };
        }
    };

    let mut stats = CycleStats {
        entries_seen: snapshot.entries.len(),
        ..CycleStats::default()
    };
    counter!("relay_entries_seen_total").increment(stats.entries_seen as u64);

    for entry in snapshot.entries.iter().filter(|e| qualifies(e, anchor)) {
        stats.qualifying += 1;
        tracing::info!(
            entry_id = %entry.id,
            author = %entry.author_name,
            updated = %entry.updated_at,
            "new comment"
        );

        let title = sanitize(&entry.title);
        let content = sanitize(&entry.content);
        tracing::debug!(entry_id = %entry.id, %title, %content, "sanitized");

        match dispatcher.dispatch(&title, &content).await {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(
                    entry_id = %entry.id,
                    error = %e,
                    sink = dispatcher.name(),
                    "delivery failed"
                );
            }
        }
    }

    counter!("relay_entries_qualifying_total").increment(stats.qualifying as u64);
    counter!("relay_dispatched_total").increment(stats.delivered as u64);
    counter!("relay_dispatch_failures_total").increment(stats.failed as u64);
    histogram!("relay_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    tracing::info!(
        seen = stats.entries_seen,
        qualifying = stats.qualifying,
        delivered = stats.delivered,
        failed = stats.failed,
        "cycle done"
    );

    CycleOutcome {
        next_anchor: cycle_start,
        error: None,
        stats,
    }
}

/// Anchor for the next cycle. Never moves backwards, even if the wall clock
/// does.
pub fn advance_anchor(current: DateTime<Utc>, outcome: &CycleOutcome) -> DateTime<Utc> {
    let next = current.max(outcome.next_anchor);
    gauge!("relay_anchor_ts").set(next.timestamp() as f64);
    next
}
