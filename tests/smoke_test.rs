//! Live smoke test against Steam Community Market and Liquipedia.
//!
//! Hits the real sites with production pacing, so a full run takes several
//! minutes and may be throttled.
//!
//! Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use steam_case_tracker::{config, CaseTracker};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn section(name: &str) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("  {}", name);
    eprintln!("{}", "=".repeat(60));
}

struct Counters {
    pass: usize,
    fail: usize,
}

impl Counters {
    fn new() -> Self {
        Self { pass: 0, fail: 0 }
    }

    fn check(&mut self, label: &str, condition: bool, detail: &str) {
        let status = if condition { "PASS" } else { "FAIL" };
        if condition {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
        if detail.is_empty() {
            eprintln!("  [{}] {}", status, label);
        } else {
            eprintln!("  [{}] {} -- {}", status, label, detail);
        }
    }
}

// ---------------------------------------------------------------------------
// Main smoke test
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn smoke_test() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = CaseTracker::builder().output_dir(dir.path()).build().unwrap();
    let mut c = Counters::new();

    section("Catalog");
    let pages = config::default_catalog_pages();
    let entries = tracker.catalog().page(&pages[0]);
    c.check("first search page has entries", !entries.is_empty(), &format!("n={}", entries.len()));
    c.check(
        "entry names decoded",
        entries.iter().all(|e| !e.name.contains('%')),
        "",
    );

    section("Prices (first page only)");
    let summary = tracker.collect_prices(&pages[..1], None).unwrap();
    c.check(
        "some entries scraped",
        summary.entries_scraped > 0,
        &format!("{}/{}", summary.entries_scraped, summary.entries_found),
    );
    if let Some(stats) = &summary.stats {
        c.check(
            "records inside window",
            stats.first_date >= summary.window.cutoff(),
            &format!("first={}", stats.first_date),
        );
    }
    c.check(
        "snapshot written",
        summary.output.as_ref().map(|p| p.exists()).unwrap_or(false),
        "",
    );

    section("Events");
    let events = tracker.collect_events(config::EVENTS_URL, None).unwrap();
    c.check("tournaments parsed", events.parsed > 0, &format!("parsed={}", events.parsed));
    c.check(
        "events ordered by start",
        events.events.windows(2).all(|w| w[0].start_date <= w[1].start_date),
        "",
    );

    section("Display");
    let display = format!("{}", tracker);
    c.check("Display impl", display.contains("CaseTracker"), &display);

    section("SMOKE TEST COMPLETE");
    eprintln!("  Passed:  {}", c.pass);
    eprintln!("  Failed:  {}", c.fail);
    assert_eq!(c.fail, 0, "{} smoke test checks failed", c.fail);
}
