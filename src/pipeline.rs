//! Sequential run orchestration for both datasets.
//!
//! Prices: entries -> fetch -> extract -> aggregate/persist, one entry at a
//! time with a randomized pause between entries. Events: one listing page ->
//! row parsing -> window filter. Nothing here is fatal except sink I/O.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::{Aggregator, PriceTable, SnapshotSink};
use crate::config::{DelayRange, RollingWindow};
use crate::error::Result;
use crate::events::{filter_window, parse_event_page};
use crate::extract::extract_price_history;
use crate::fetcher::Fetcher;
use crate::models::{EntryRef, EventRecord, PriceTrend, TableStats};

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// An entry that contributed nothing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PriceRunSummary {
    pub window: RollingWindow,
    pub entries_found: usize,
    pub entries_scraped: usize,
    pub records: usize,
    pub skipped: Vec<SkippedEntry>,
    pub stats: Option<TableStats>,
    pub trends: Vec<PriceTrend>,
    /// Snapshot location; `None` when nothing was written.
    pub output: Option<PathBuf>,
}

impl PriceRunSummary {
    fn from_table(window: RollingWindow, entries_found: usize, table: &PriceTable, skipped: Vec<SkippedEntry>) -> Self {
        Self {
            window,
            entries_found,
            entries_scraped: table.scraped_items().len(),
            records: table.len(),
            skipped,
            stats: table.stats(),
            trends: table.trends(),
            output: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventRunSummary {
    pub window: RollingWindow,
    pub rows_seen: usize,
    pub candidates: usize,
    pub parsed: usize,
    /// Events inside the window, ordered by start date.
    pub events: Vec<EventRecord>,
    pub output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// Fetch, extract and persist every entry in order.
///
/// The sink receives the full table after each entry that yielded data and
/// once more at the end.
pub fn harvest_prices(
    fetcher: &Fetcher,
    entries: &[EntryRef],
    window: &RollingWindow,
    entry_delay: DelayRange,
    sink: &mut dyn SnapshotSink,
) -> Result<PriceRunSummary> {
    let mut agg = Aggregator::new(sink);
    let mut skipped = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        info!(n = idx + 1, of = entries.len(), item = entry.name.as_str(), "fetching price history");

        let outcome = fetcher
            .fetch(&entry.url)
            .and_then(|html| extract_price_history(&html, &entry.name, window));

        match outcome {
            Ok(observations) => agg.accept(&entry.name, observations)?,
            Err(e) => {
                let reason = e.to_string();
                warn!(item = entry.name.as_str(), reason = reason.as_str(), "entry skipped");
                skipped.push(SkippedEntry {
                    name: entry.name.clone(),
                    reason,
                });
            }
        }

        if idx + 1 < entries.len() {
            fetcher.pause(entry_delay);
        }
    }

    let table = agg.finish()?;
    let summary = PriceRunSummary::from_table(*window, entries.len(), &table, skipped);
    log_price_summary(&summary);
    Ok(summary)
}

fn log_price_summary(summary: &PriceRunSummary) {
    match &summary.stats {
        Some(stats) => info!(
            records = stats.records,
            unique_items = stats.unique_items,
            scraped = summary.entries_scraped,
            of = summary.entries_found,
            first = %stats.first_date,
            last = %stats.last_date,
            min_price = stats.min_price,
            max_price = stats.max_price,
            "price run complete"
        ),
        None => info!(of = summary.entries_found, "price run complete; no price data collected"),
    }
    for trend in &summary.trends {
        info!(item = trend.item_name.as_str(), points = trend.data_points, "records per item");
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Fetch the tournament listing and keep window events mentioning `years`.
///
/// An unavailable page yields an empty summary rather than an error.
pub fn harvest_events(
    fetcher: &Fetcher,
    url: &str,
    window: &RollingWindow,
    years: &[i32],
) -> Result<EventRunSummary> {
    let mut summary = EventRunSummary {
        window: *window,
        rows_seen: 0,
        candidates: 0,
        parsed: 0,
        events: Vec::new(),
        output: None,
    };

    let html = match fetcher.fetch(url) {
        Ok(html) => html,
        Err(e) => {
            warn!(url, error = %e, "tournament listing unavailable");
            return Ok(summary);
        }
    };

    let page = parse_event_page(&html, years)?;
    summary.rows_seen = page.rows_seen;
    summary.candidates = page.candidates;
    summary.parsed = page.events.len();
    summary.events = filter_window(page.events, window);

    info!(
        rows = summary.rows_seen,
        candidates = summary.candidates,
        parsed = summary.parsed,
        kept = summary.events.len(),
        cutoff = %window.cutoff().date(),
        "tournament listing parsed"
    );
    Ok(summary)
}
