// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod notify;
pub mod sanitize;
pub mod sync;

// ---- Re-exports for stable public API ----
pub use crate::error::{DeliveryError, FeedError};
pub use crate::feed::{Entry, FeedSnapshot, FeedSource};
pub use crate::notify::{Dispatcher, NotificationPayload};
pub use crate::sanitize::sanitize;
pub use crate::sync::{qualifies, run_cycle, CycleOutcome, CycleStats};
