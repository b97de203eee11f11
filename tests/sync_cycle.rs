// tests/sync_cycle.rs
mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use comment_relay::error::FeedError;
use comment_relay::feed::fetcher::FixtureFeedSource;
use comment_relay::sync::{run_cycle, run_cycle_at};
use common::{entry, RecordingDispatcher, ScriptedSource};

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn one_comment_and_one_other_activity() {
    let a = anchor();
    let source = ScriptedSource::always(vec![
        entry("comment-1", "comment", a + Duration::hours(1)),
        entry("status-1", "resolved", a + Duration::hours(2)),
    ]);
    let sink = RecordingDispatcher::default();

    let out = run_cycle(&source, &sink, a).await;

    assert!(out.error.is_none());
    assert_eq!(sink.titles(), vec!["comment-1 title".to_string()]);
    assert_eq!(out.stats.entries_seen, 2);
    assert_eq!(out.stats.qualifying, 1);
    assert_eq!(out.stats.delivered, 1);
}

#[tokio::test]
async fn non_comments_never_dispatch() {
    let a = anchor();
    let source = ScriptedSource::always(vec![
        entry("a", "resolved", a + Duration::hours(1)),
        entry("b", "created", a + Duration::days(400)),
        entry("c", "", a + Duration::minutes(1)),
        entry("d", "Comment", a + Duration::minutes(1)),
    ]);
    let sink = RecordingDispatcher::default();

    run_cycle(&source, &sink, a).await;
    assert!(sink.titles().is_empty());
}

#[tokio::test]
async fn old_and_boundary_entries_never_dispatch() {
    let a = anchor();
    let source = ScriptedSource::always(vec![
        entry("old", "comment", a - Duration::seconds(1)),
        entry("exact", "comment", a),
        entry("epoch", "comment", DateTime::<Utc>::UNIX_EPOCH),
    ]);
    let sink = RecordingDispatcher::default();

    let out = run_cycle(&source, &sink, a).await;
    assert!(sink.titles().is_empty());
    assert_eq!(out.stats.qualifying, 0);
}

#[tokio::test]
async fn each_qualifying_entry_once_in_feed_order() {
    let a = anchor();
    // Deliberately out of timestamp order.
    let source = ScriptedSource::always(vec![
        entry("late", "comment", a + Duration::hours(3)),
        entry("early", "comment", a + Duration::hours(1)),
        entry("skip", "resolved", a + Duration::hours(2)),
        entry("mid", "comment", a + Duration::hours(2)),
    ]);
    let sink = RecordingDispatcher::default();

    run_cycle(&source, &sink, a).await;
    assert_eq!(
        sink.titles(),
        vec![
            "late title".to_string(),
            "early title".to_string(),
            "mid title".to_string()
        ]
    );
}

#[tokio::test]
async fn content_is_sanitized_before_dispatch() {
    let a = anchor();
    let source = ScriptedSource::always(vec![entry("x", "comment", a + Duration::hours(1))]);
    let sink = RecordingDispatcher::default();

    run_cycle(&source, &sink, a).await;
    let sent = sink.sent.lock().clone();
    assert_eq!(sent, vec![("x title".to_string(), r"\n\nbody of x".to_string())]);
}

#[tokio::test]
async fn delivery_failure_does_not_stop_the_cycle() {
    let a = anchor();
    let source = ScriptedSource::always(vec![
        entry("first", "comment", a + Duration::hours(1)),
        entry("broken", "comment", a + Duration::hours(1)),
        entry("last", "comment", a + Duration::hours(1)),
    ]);
    let sink = RecordingDispatcher::failing_on("broken");

    let out = run_cycle(&source, &sink, a).await;
    assert!(out.error.is_none());
    assert_eq!(sink.titles().len(), 3);
    assert_eq!(out.stats.delivered, 2);
    assert_eq!(out.stats.failed, 1);
}

#[tokio::test]
async fn feed_failure_still_advances_anchor() {
    let a = anchor();
    let source = ScriptedSource::new(vec![Err(FeedError::HttpStatus(503))]);
    let sink = RecordingDispatcher::default();
    let start = a + Duration::seconds(10);

    let out = run_cycle_at(&source, &sink, a, start).await;
    assert!(matches!(out.error, Some(FeedError::HttpStatus(503))));
    assert_eq!(out.next_anchor, start);
    assert!(out.next_anchor >= a);
    assert!(sink.titles().is_empty());
}

#[tokio::test]
async fn next_anchor_is_cycle_start_not_max_entry() {
    let a = anchor();
    let future = a + Duration::days(30);
    let source = ScriptedSource::always(vec![entry("x", "comment", future)]);
    let sink = RecordingDispatcher::default();
    let start = a + Duration::seconds(10);

    let out = run_cycle_at(&source, &sink, a, start).await;
    assert_eq!(out.next_anchor, start);
}

#[tokio::test]
async fn second_cycle_does_not_repeat() {
    let a = anchor();
    let source = ScriptedSource::always(vec![entry("x", "comment", a + Duration::seconds(5))]);
    let sink = RecordingDispatcher::default();

    let first = run_cycle_at(&source, &sink, a, a + Duration::seconds(10)).await;
    run_cycle_at(&source, &sink, first.next_anchor, a + Duration::seconds(20)).await;
    assert_eq!(sink.titles().len(), 1);
}

#[tokio::test]
async fn fixture_backfill_sends_parsed_comments_only() {
    let source = FixtureFeedSource::from_fixture(common::ACTIVITY_XML);
    let sink = RecordingDispatcher::default();
    let backfill = Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0).unwrap();

    let out = run_cycle(&source, &sink, backfill).await;
    assert_eq!(out.stats.entries_seen, 4);

    // 0001 and 0003 are comments with real timestamps; 0002 is a status
    // change and 0004 has an unparsable timestamp.
    let sent = sink.sent.lock().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0].0,
        "<https://jira.example.com/secure/ViewProfile.jspa?name=alice|Alice Doe> commented on <https://jira.example.com/browse/OPS-1|OPS-1 - Disk full>"
    );
    assert_eq!(
        sent[0].1,
        r"\n\nCleared the logs. \n\nSee <https://wiki.example.com/runbook|runbook>."
    );
    assert_eq!(sent[1].0, "Carol commented on OPS-2");
    assert_eq!(sent[1].1, r"Looks good\nto me");
}
