// src/config.rs
//! Startup configuration.
//!
//! Credentials and endpoints come from the environment only. Tunables can
//! also live in a TOML file; environment values win over the file, the file
//! wins over defaults. Every error here is fatal at startup.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::sync::scheduler::{default_backfill_anchor, SchedulerCfg};

pub const ENV_FEED_URL: &str = "JIRA_URL";
pub const ENV_FEED_USERNAME: &str = "JIRA_USERNAME";
pub const ENV_FEED_PASSWORD: &str = "JIRA_PASSWORD";
pub const ENV_WEBHOOK: &str = "SLACK_WEBHOOK";
pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";
pub const ENV_POLL_INTERVAL: &str = "RELAY_POLL_INTERVAL_SECS";
pub const ENV_MAX_ITEMS: &str = "RELAY_MAX_ITEMS";
pub const ENV_FETCH_TIMEOUT: &str = "RELAY_FETCH_TIMEOUT_SECS";
pub const ENV_DISPATCH_TIMEOUT: &str = "RELAY_DISPATCH_TIMEOUT_SECS";
pub const ENV_BACKFILL_SINCE: &str = "RELAY_BACKFILL_SINCE";
pub const ENV_DRY_RUN: &str = "RELAY_DRY_RUN";
pub const ENV_FEED_FIXTURE: &str = "RELAY_FEED_FIXTURE";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_MAX_ITEMS: u32 = 100;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 10;

/// Optional tunables file. Unknown keys are rejected so typos surface.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileTunables {
    pub poll_interval_secs: Option<u64>,
    pub max_items: Option<u32>,
    pub fetch_timeout_secs: Option<u64>,
    pub dispatch_timeout_secs: Option<u64>,
    pub backfill_since: Option<String>,
    pub dry_run: Option<bool>,
    pub metrics_addr: Option<String>,
    pub feed_fixture: Option<PathBuf>,
}

/// Where snapshots come from.
#[derive(Clone)]
pub enum FeedSettings {
    Http {
        base_url: String,
        username: String,
        password: String,
    },
    /// Local Atom file, re-read once at startup.
    Fixture(PathBuf),
}

impl fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSettings::Http {
                base_url, username, ..
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            FeedSettings::Fixture(p) => f.debug_tuple("Fixture").field(p).finish(),
        }
    }
}

/// Where notifications go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSettings {
    Webhook(String),
    DryRun,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub feed: FeedSettings,
    pub sink: SinkSettings,
    pub max_items: u32,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub dispatch_timeout: Duration,
    pub backfill_since: DateTime<Utc>,
    pub metrics_addr: Option<SocketAddr>,
}

impl RelayConfig {
    /// Environment plus the optional tunables file.
    pub fn from_env() -> Result<Self> {
        let file = load_tunables_default()?;
        Self::from_parts(file, |k| std::env::var(k).ok())
    }

    /// Build from a tunables file and a key lookup (normally `std::env::var`).
    pub fn from_parts<F>(file: FileTunables, get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dry_run = match get(ENV_DRY_RUN) {
            Some(v) => parse_bool(ENV_DRY_RUN, &v)?,
            None => file.dry_run.unwrap_or(false),
        };

        let fixture = get(ENV_FEED_FIXTURE)
            .map(PathBuf::from)
            .or(file.feed_fixture);
        let feed = match fixture {
            Some(path) => FeedSettings::Fixture(path),
            None => FeedSettings::Http {
                base_url: required(&get, ENV_FEED_URL)?,
                username: required(&get, ENV_FEED_USERNAME)?,
                password: required(&get, ENV_FEED_PASSWORD)?,
            },
        };

        let sink = match (get(ENV_WEBHOOK), dry_run) {
            (_, true) => SinkSettings::DryRun,
            (Some(url), false) => SinkSettings::Webhook(url),
            (None, false) => {
                bail!("{ENV_WEBHOOK} is not set (set {ENV_DRY_RUN}=1 to run without a sink)")
            }
        };

        let poll_interval_secs = positive(
            &get,
            ENV_POLL_INTERVAL,
            file.poll_interval_secs,
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let fetch_timeout_secs = positive(
            &get,
            ENV_FETCH_TIMEOUT,
            file.fetch_timeout_secs,
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;
        let dispatch_timeout_secs = positive(
            &get,
            ENV_DISPATCH_TIMEOUT,
            file.dispatch_timeout_secs,
            DEFAULT_DISPATCH_TIMEOUT_SECS,
        )?;
        let max_items = positive(
            &get,
            ENV_MAX_ITEMS,
            file.max_items.map(u64::from),
            u64::from(DEFAULT_MAX_ITEMS),
        )?;
        let max_items = u32::try_from(max_items)
            .map_err(|_| anyhow!("{ENV_MAX_ITEMS} is out of range: {max_items}"))?;

        let backfill_since = match get(ENV_BACKFILL_SINCE).or(file.backfill_since) {
            Some(v) => DateTime::parse_from_rfc3339(&v)
                .with_context(|| format!("{ENV_BACKFILL_SINCE} is not an RFC 3339 timestamp: {v}"))?
                .with_timezone(&Utc),
            None => default_backfill_anchor(),
        };

        let metrics_addr = match get(ENV_METRICS_ADDR).or(file.metrics_addr) {
            Some(v) => Some(
                v.parse::<SocketAddr>()
                    .with_context(|| format!("{ENV_METRICS_ADDR} is not a socket address: {v}"))?,
            ),
            None => None,
        };

        Ok(Self {
            feed,
            sink,
            max_items,
            poll_interval: Duration::from_secs(poll_interval_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            dispatch_timeout: Duration::from_secs(dispatch_timeout_secs),
            backfill_since,
            metrics_addr,
        })
    }

    pub fn scheduler(&self) -> SchedulerCfg {
        SchedulerCfg {
            interval: self.poll_interval,
            backfill_anchor: self.backfill_since,
        }
    }
}

fn required<G: Fn(&str) -> Option<String>>(get: &G, key: &str) -> Result<String> {
    get(key).ok_or_else(|| anyhow!("{key} is not set"))
}

fn positive<G: Fn(&str) -> Option<String>>(
    get: &G,
    key: &str,
    from_file: Option<u64>,
    default: u64,
) -> Result<u64> {
    let v = match get(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} is not a number: {raw}"))?,
        None => from_file.unwrap_or(default),
    };
    if v == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(v)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} is not a boolean: {raw}")),
    }
}

/// Parse a tunables file from an explicit path.
pub fn load_tunables_from(path: &Path) -> Result<FileTunables> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading relay config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Tunables file lookup:
/// 1) $RELAY_CONFIG_PATH (must exist)
/// 2) config/relay.toml
/// 3) none
pub fn load_tunables_default() -> Result<FileTunables> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_tunables_from(&pb);
        }
        bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return load_tunables_from(&default);
    }
    Ok(FileTunables::default())
}
