// src/feed/decode.rs
//! Atom activity document → `FeedSnapshot`.
//!
//! Document-level problems are errors. Entry-level problems are not: a bad
//! or missing timestamp pins the entry to the Unix epoch so it never counts
//! as new.

use chrono::{DateTime, Utc};
use metrics::counter;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use super::{Entry, FeedSnapshot, TimestampDecode};
use crate::error::FeedError;

// Every child is taken as a list and the first one wins. Extension elements
// can share a local name with a known child (`dc:updated`, `usr:id`), and a
// scalar field would reject the repeat and fail the whole document.

#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(default)]
    id: Vec<RawText>,
    #[serde(default)]
    title: Vec<RawText>,
    #[serde(default, rename = "entry")]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, rename = "@updated")]
    updated_attr: Option<String>,
    #[serde(default)]
    id: Vec<RawText>,
    #[serde(default)]
    title: Vec<RawText>,
    #[serde(default)]
    content: Vec<RawText>,
    #[serde(default, rename = "author")]
    authors: Vec<RawAuthor>,
    #[serde(default, rename = "category")]
    categories: Vec<RawCategory>,
    #[serde(default)]
    updated: Vec<RawText>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: Vec<RawText>,
    #[serde(default)]
    email: Vec<RawText>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default, rename = "@term")]
    term: Option<String>,
}

/// Text content of an element; attributes and child elements are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawText {
    #[serde(default, rename = "$text")]
    value: String,
}

fn first_text(list: Vec<RawText>) -> Option<String> {
    list.into_iter().next().map(|t| t.value)
}

const OFFSET_NO_COLON: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse an activity timestamp. RFC 3339 first, then the colon-less offset
/// form (`2021-01-02T15:04:05.000-0700`). Fractional seconds are optional in
/// both.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, OFFSET_NO_COLON))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `updated` elements in document order, then the entry attribute; the first
/// candidate that parses is used.
pub fn decode_timestamp(
    elements: &[&str],
    attribute: Option<&str>,
) -> (DateTime<Utc>, TimestampDecode) {
    let candidates: Vec<&str> = elements
        .iter()
        .copied()
        .chain(attribute)
        .filter(|s| !s.trim().is_empty())
        .collect();

    let Some(first) = candidates.first() else {
        return (DateTime::<Utc>::UNIX_EPOCH, TimestampDecode::Missing);
    };

    match candidates.iter().find_map(|c| parse_timestamp(c)) {
        Some(ts) => (ts, TimestampDecode::Parsed),
        None => (
            DateTime::<Utc>::UNIX_EPOCH,
            TimestampDecode::Malformed(first.trim().to_string()),
        ),
    }
}

/// Local name of the first element in the document, or an error if there is
/// none.
fn root_element_name(xml: &str) -> Result<String, FeedError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(FeedError::Malformed("document has no root element".into()))
            }
            Ok(_) => continue,
            Err(e) => return Err(FeedError::Malformed(e.to_string())),
        }
    }
}

/// Decode one fetched body.
pub fn decode(raw: &[u8]) -> Result<FeedSnapshot, FeedError> {
    let text = std::str::from_utf8(raw).map_err(|_| FeedError::NotUtf8)?;
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(FeedError::EmptyBody);
    }

    let root = root_element_name(text)?;
    if root != "feed" {
        return Err(FeedError::NotAFeed { root });
    }

    let feed: RawFeed =
        quick_xml::de::from_str(text).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let entries = feed.entries.into_iter().map(into_entry).collect();
    Ok(FeedSnapshot {
        id: first_text(feed.id),
        title: first_text(feed.title),
        entries,
    })
}

fn into_entry(raw: RawEntry) -> Entry {
    let updated: Vec<&str> = raw.updated.iter().map(|t| t.value.as_str()).collect();
    let (updated_at, timestamp) = decode_timestamp(&updated, raw.updated_attr.as_deref());
    let id = first_text(raw.id).unwrap_or_default().trim().to_string();

    if timestamp.is_degraded() {
        tracing::warn!(entry_id = %id, timestamp = ?timestamp, "entry timestamp degraded to epoch");
        counter!("relay_entry_decode_degraded_total").increment(1);
    }

    let author = raw.authors.into_iter().next();
    let (author_name, author_email) = author
        .map(|a| {
            (
                first_text(a.name).unwrap_or_default(),
                first_text(a.email).unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let category_term = raw
        .categories
        .into_iter()
        .find_map(|c| c.term)
        .unwrap_or_default();

    Entry {
        id,
        title: first_text(raw.title).unwrap_or_default(),
        content: first_text(raw.content).unwrap_or_default(),
        author_name: author_name.trim().to_string(),
        author_email: author_email.trim().to_string(),
        category_term: category_term.trim().to_string(),
        updated_at,
        timestamp,
    }
}
