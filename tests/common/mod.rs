//! Shared fixtures for the integration tests.
//!
//! Provides a scripted [`Transport`] that answers from per-URL queues, HTML
//! builders for listing, price and tournament pages, and a tracker factory
//! wired to both with every randomized pause zeroed.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use steam_case_tracker::{
    CaseTracker, PriceTable, RawResponse, Result, RollingWindow, Sleeper, SnapshotSink, Transport,
    TrackerError,
};
use steam_case_tracker::models::PriceObservation;

pub const LISTING_BASE: &str = "https://steamcommunity.com/market/listings/730/";

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// Answers GETs from per-URL queues. An exhausted or unknown URL answers 404.
/// Clones share state, so a test can keep a handle after handing one over.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    queues: Arc<Mutex<HashMap<String, VecDeque<Result<RawResponse>>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, status: StatusCode, body: &str) -> &Self {
        self.queues
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn ok(&self, url: &str, body: &str) -> &Self {
        self.push(url, StatusCode::OK, body)
    }

    pub fn throttle(&self, url: &str, times: usize) -> &Self {
        for _ in 0..times {
            self.push(url, StatusCode::TOO_MANY_REQUESTS, "");
        }
        self
    }

    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.queues
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Err(TrackerError::NotFound(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let next = self
            .queues
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front());
        next.unwrap_or_else(|| Ok(RawResponse::new(StatusCode::NOT_FOUND, "")))
    }
}

// ---------------------------------------------------------------------------
// Recording sleeper
// ---------------------------------------------------------------------------

/// Records requested pauses instead of sleeping. Clones share the log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    log: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.log.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.log.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

/// Keeps a copy of every snapshot it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub snapshots: Vec<Vec<PriceObservation>>,
}

impl SnapshotSink for RecordingSink {
    fn write_snapshot(&mut self, rows: &[PriceObservation]) -> Result<()> {
        self.snapshots.push(rows.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tracker factory
// ---------------------------------------------------------------------------

pub fn tracker(transport: &ScriptedTransport, sleeper: &RecordingSleeper, out: &std::path::Path) -> CaseTracker {
    CaseTracker::builder()
        .output_dir(out)
        .no_delays()
        .transport(transport.clone())
        .sleeper(sleeper.clone())
        .build()
        .unwrap()
}

/// Window anchored at 2025-12-01 00:00 UTC (cutoff 2024-12-01).
pub fn fixed_window() -> RollingWindow {
    RollingWindow::anchored_at(Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap())
}

// ---------------------------------------------------------------------------
// HTML builders
// ---------------------------------------------------------------------------

pub fn listing_url(name: &str) -> String {
    format!("{}{}", LISTING_BASE, urlencoding::encode(name))
}

/// URL an entry from [`listing_page`] resolves to.
pub fn entry_url(name: &str) -> String {
    format!("{}?filter=x", listing_url(name))
}

pub fn search_url(start: usize) -> String {
    format!(
        "https://steamcommunity.com/market/search?appid=730&category_730_Type%5B%5D=tag_CSGO_Type_WeaponCase&start={}",
        start
    )
}

/// A search results page using the primary row-link markup.
pub fn listing_page(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|n| {
            format!(
                r#"<a class="market_listing_row_link" href="{}?filter=x"><div class="market_listing_row">{}</div></a>"#,
                listing_url(n),
                n
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="searchResultsRows">{}</div></body></html>"#,
        rows
    )
}

/// A search results page whose links lack the row-link class.
pub fn fallback_listing_page(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|n| format!(r#"<a class="other" href="{}">{}</a>"#, listing_url(n), n))
        .collect();
    format!(
        r#"<html><body><a href="/market/">Market</a>{}</body></html>"#,
        rows
    )
}

/// A listing page embedding `points` as its price history literal.
pub fn price_page(points: &serde_json::Value) -> String {
    format!(
        "<html><head><script type=\"text/javascript\">\n\t\tvar line1={};\n\t\tg_timePriceHistoryEarliest = new Date();\n</script></head><body></body></html>",
        points
    )
}

/// One tournament grid row.
pub fn event_row(name: &str, dates: &str, prize: &str, flag: Option<&str>) -> String {
    let flag = flag
        .map(|alt| format!(r#"<img src="/commons/images/{}_hd.png" alt="{}">"#, alt.to_lowercase(), alt))
        .unwrap_or_default();
    format!(
        r#"<div class="gridRow">
  <div class="gridCell Tier Header"><a href="/counterstrike/S-Tier_Tournaments">S-Tier</a></div>
  <div class="gridCell Tournament Header"><span><a href="/counterstrike/{slug}"><img src="/x.png"></a></span><a href="/counterstrike/{slug}">{name}</a></div>
  <div class="gridCell EventDetails Date Header">{dates}</div>
  <div class="gridCell EventDetails Prize Header">{prize}</div>
  <div class="gridCell EventDetails Location Header">{flag}<span>City</span></div>
</div>"#,
        slug = name.replace(' ', "_"),
        name = name,
        dates = dates,
        prize = prize,
        flag = flag
    )
}

pub fn event_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><div class="gridTable tournamentCard">{}</div></body></html>"#,
        rows.join("\n")
    )
}

pub fn table_names(table: &PriceTable) -> Vec<String> {
    let mut names: Vec<String> = table.rows().iter().map(|r| r.item_name.clone()).collect();
    names.dedup();
    names
}
