//! The async wrapper delegates to the blocking tracker on the blocking pool.

#![cfg(feature = "async")]

mod common;

use common::{event_page, event_row, RecordingSleeper, ScriptedTransport};
use steam_case_tracker::AsyncCaseTracker;

#[tokio::test]
async fn collect_events_runs_off_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://liquipedia.net/counterstrike/S-Tier_Tournaments";
    let transport = ScriptedTransport::new();
    transport.ok(url, &event_page(&[event_row("Ancient Cup", "Mar 1 - 5, 2019", "$50,000", None)]));
    let sleeper = RecordingSleeper::new();
    let tracker = AsyncCaseTracker::from_tracker(common::tracker(&transport, &sleeper, dir.path()));

    let summary = tracker.collect_events(url.to_string(), None).await.unwrap();
    assert_eq!(summary.rows_seen, 1);
    assert!(summary.events.is_empty());
    assert_eq!(transport.requests(), vec![url.to_string()]);
}

#[tokio::test]
async fn run_exposes_the_blocking_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let sleeper = RecordingSleeper::new();
    let tracker = AsyncCaseTracker::from_tracker(common::tracker(&transport, &sleeper, dir.path()));

    let expected = dir.path().to_path_buf();
    let out = tracker.run(|t| Ok(t.output_dir().to_path_buf())).await.unwrap();
    assert_eq!(out, expected);
}
