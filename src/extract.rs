//! Price history extraction from market listing pages.
//!
//! A listing page embeds its full sale history as a JavaScript assignment:
//!
//! ```text
//! var line1=[["Nov 24 2025 01: +0",0.512,"1408"],["Nov 25 2025 01: +0",0.498,"1210"]];
//! ```
//!
//! Extraction locates that literal, decodes it as JSON, converts each
//! `[date, price, volume]` triple independently and keeps only points inside
//! the rolling window. A malformed triple is dropped on its own and never
//! costs the rest of the batch.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{RollingWindow, PRICE_MARKER};
use crate::error::{Result, TrackerError};
use crate::models::PriceObservation;

// ---------------------------------------------------------------------------
// Per-tuple rejection
// ---------------------------------------------------------------------------

/// Why a single triple was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    NotAnArray,
    MissingField,
    BadDate,
    BadPrice,
    BadVolume,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::NotAnArray => "not an array",
            Rejection::MissingField => "missing field",
            Rejection::BadDate => "unparseable date",
            Rejection::BadPrice => "bad price",
            Rejection::BadVolume => "bad volume",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Outcome of decoding one page's embedded history.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Accepted points inside the window, in source order.
    pub observations: Vec<PriceObservation>,
    /// Triples in the embedded literal.
    pub total: usize,
    /// Well-formed triples older than the window cutoff.
    pub outside_window: usize,
    /// Dropped triples by reason.
    pub rejected: BTreeMap<Rejection, usize>,
}

impl Extraction {
    pub fn rejected_count(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Decode the embedded history in `html` for `item_name`.
///
/// Fails with `NotFound` when the marker is absent and with `Json` when the
/// matched literal is not valid JSON. Per-triple problems never fail the call.
pub fn extract_detailed(html: &str, item_name: &str, window: &RollingWindow) -> Result<Extraction> {
    let re = Regex::new(PRICE_MARKER).map_err(|e| TrackerError::Parse(e.to_string()))?;
    let literal = re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| TrackerError::NotFound("price history marker `var line1` not on page".into()))?
        .as_str();

    let rows: Vec<Value> = serde_json::from_str(literal)?;

    let mut out = Extraction {
        total: rows.len(),
        ..Extraction::default()
    };

    for row in &rows {
        match decode_triple(row) {
            Ok((date, price, volume)) => {
                if window.contains(date) {
                    out.observations.push(PriceObservation {
                        item_name: item_name.to_string(),
                        date,
                        price,
                        volume,
                    });
                } else {
                    out.outside_window += 1;
                }
            }
            Err(reason) => {
                *out.rejected.entry(reason).or_insert(0) += 1;
            }
        }
    }

    Ok(out)
}

/// Extract window-filtered observations for one entry.
///
/// Fails when the page carries no usable history. The error names the cause:
/// a missing marker, an undecodable literal, or every triple rejected or
/// older than the cutoff.
pub fn extract_price_history(
    html: &str,
    item_name: &str,
    window: &RollingWindow,
) -> Result<Vec<PriceObservation>> {
    let extraction = extract_detailed(html, item_name, window)?;

    if !extraction.rejected.is_empty() {
        warn!(
            item = item_name,
            rejected = extraction.rejected_count(),
            total = extraction.total,
            reasons = rejection_breakdown(&extraction).as_str(),
            "dropped malformed price points"
        );
    }

    if extraction.observations.is_empty() {
        let reason = if extraction.total == 0 {
            "empty price history".to_string()
        } else {
            format!(
                "no price points inside the window ({} of {} rejected [{}], {} outside window)",
                extraction.rejected_count(),
                extraction.total,
                rejection_breakdown(&extraction),
                extraction.outside_window
            )
        };
        return Err(TrackerError::NotFound(reason));
    }

    debug!(
        item = item_name,
        kept = extraction.observations.len(),
        outside_window = extraction.outside_window,
        "extracted price points"
    );
    Ok(extraction.observations)
}

fn rejection_breakdown(extraction: &Extraction) -> String {
    extraction
        .rejected
        .iter()
        .map(|(r, n)| format!("{}={}", r, n))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Triple decoding
// ---------------------------------------------------------------------------

fn decode_triple(row: &Value) -> std::result::Result<(NaiveDateTime, f64, i64), Rejection> {
    let fields = row.as_array().ok_or(Rejection::NotAnArray)?;
    if fields.len() < 2 {
        return Err(Rejection::MissingField);
    }

    let date = fields[0]
        .as_str()
        .and_then(parse_market_timestamp)
        .ok_or(Rejection::BadDate)?;
    let price = parse_price(&fields[1]).ok_or(Rejection::BadPrice)?;
    let volume = match fields.get(2) {
        Some(v) => parse_volume(v).ok_or(Rejection::BadVolume)?,
        None => 0,
    };

    Ok((date, price, volume))
}

fn parse_price(v: &Value) -> Option<f64> {
    let price = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

fn parse_volume(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a history timestamp.
///
/// The market renders hour-granular UTC stamps as `"Nov 24 2025 01: +0"`.
/// RFC 2822 stamps (`"Mon, 24 Nov 2025 01:00:00 GMT"`) are accepted as well.
pub fn parse_market_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    parse_hourly_stamp(s).or_else(|| {
        DateTime::parse_from_rfc2822(s)
            .ok()
            .map(|dt| dt.naive_utc())
    })
}

fn parse_hourly_stamp(s: &str) -> Option<NaiveDateTime> {
    let body = s.strip_suffix("+0")?.trim_end();
    let parts: Vec<&str> = body.split_whitespace().collect();
    let [month, day, year, hour] = parts.as_slice() else {
        return None;
    };
    let hour: u32 = hour.strip_suffix(':')?.parse().ok()?;
    let date = NaiveDate::parse_from_str(&format!("{} {} {}", month, day, year), "%b %d %Y").ok()?;
    date.and_hms_opt(hour, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_market_hourly_stamp() {
        let ts = parse_market_timestamp("Nov 24 2025 01: +0").unwrap();
        assert_eq!(ts.to_string(), "2025-11-24 01:00:00");
    }

    #[test]
    fn parses_rfc2822_stamp() {
        let ts = parse_market_timestamp("Mon, 01 Jan 2024 01:00:00 GMT").unwrap();
        assert_eq!(ts.to_string(), "2024-01-01 01:00:00");
    }

    #[test]
    fn rejects_garbage_stamps() {
        assert!(parse_market_timestamp("").is_none());
        assert!(parse_market_timestamp("Nov 24 2025").is_none());
        assert!(parse_market_timestamp("Nov 24 2025 25: +0").is_none());
        assert!(parse_market_timestamp("Foo 24 2025 01: +0").is_none());
    }

    #[test]
    fn price_must_be_positive_number() {
        assert_eq!(parse_price(&serde_json::json!(1.5)), Some(1.5));
        assert_eq!(parse_price(&serde_json::json!("2.25")), Some(2.25));
        assert_eq!(parse_price(&serde_json::json!(0)), None);
        assert_eq!(parse_price(&serde_json::json!("abc")), None);
        assert_eq!(parse_price(&serde_json::json!(null)), None);
    }

    #[test]
    fn volume_accepts_numeric_strings() {
        assert_eq!(parse_volume(&serde_json::json!("456")), Some(456));
        assert_eq!(parse_volume(&serde_json::json!(12)), Some(12));
        assert_eq!(parse_volume(&serde_json::json!("n/a")), None);
    }
}
