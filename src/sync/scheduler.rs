// src/sync/scheduler.rs
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{advance_anchor, run_cycle};
use crate::feed::FeedSource;
use crate::notify::Dispatcher;

/// 2009-11-10T23:00:00Z. Old enough that the first cycle replays everything
/// the feed page still shows.
pub const DEFAULT_BACKFILL_UNIX: i64 = 1_257_894_000;

pub fn default_backfill_anchor() -> DateTime<Utc> {
    DateTime::from_timestamp(DEFAULT_BACKFILL_UNIX, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    /// Idle time between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Anchor for the first cycle.
    pub backfill_anchor: DateTime<Utc>,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            backfill_anchor: default_backfill_anchor(),
        }
    }
}

/// Run `limit` cycles (or forever with `None`) and return the last anchor.
///
/// The first cycle runs immediately with the backfill anchor. Cycles never
/// overlap; the sleep only starts once a cycle has finished.
pub async fn run_cycles(
    source: &dyn FeedSource,
    dispatcher: &dyn Dispatcher,
    cfg: SchedulerCfg,
    limit: Option<usize>,
) -> DateTime<Utc> {
    let mut anchor = cfg.backfill_anchor;
    let mut done = 0usize;

    loop {
        let outcome = run_cycle(source, dispatcher, anchor).await;
        anchor = advance_anchor(anchor, &outcome);
        done += 1;

        if limit.is_some_and(|n| done >= n) {
            return anchor;
        }
        tokio::time::sleep(cfg.interval).await;
    }
}

/// The production loop. Only returns if the process is shutting down.
pub async fn run_forever(source: &dyn FeedSource, dispatcher: &dyn Dispatcher, cfg: SchedulerCfg) {
    tracing::info!(
        interval_secs = cfg.interval.as_secs(),
        backfill = %cfg.backfill_anchor,
        "comment sync started"
    );
    run_cycles(source, dispatcher, cfg, None).await;
}
