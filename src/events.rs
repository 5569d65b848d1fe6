//! Tournament calendar scraping and date-range resolution.
//!
//! Each `div.gridRow` of the S-Tier listing is reduced to its text, checked
//! against the target years, and resolved into an [`EventRecord`]. Rows that
//! lack a name, a date pattern, or a resolvable date range are skipped.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::aggregate::write_csv_atomic;
use crate::config::{RollingWindow, EVENT_DATE_FORMAT, EVENT_LINK_PATH, UNKNOWN};
use crate::error::{Result, TrackerError};
use crate::models::EventRecord;

const ROW_SELECTOR: &str = "div.gridRow";
const HEADER_SELECTOR: &str = "div.Tournament";
const FLAG_SELECTOR: &str = r#"img[src*="hd.png"]"#;
const PRIZE_PATTERN: &str = r"\$[\d,]+";

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// Resolve `"<Mon> <D> - <Mon> <D>, <YYYY>"` or `"<Mon> <D> - <D>, <YYYY>"`
/// into a start/end pair.
///
/// A one-token end inherits the start month. Every other shape is an error.
pub fn parse_date_range(text: &str) -> Result<(NaiveDate, NaiveDate)> {
    let bad = |why: &str| TrackerError::Parse(format!("date range '{}': {}", text, why));

    let parts: Vec<&str> = text.split(" - ").collect();
    let [start_frag, end_frag] = parts.as_slice() else {
        return Err(bad("expected exactly one ' - ' separator"));
    };
    let (start_frag, end_frag) = (start_frag.trim(), end_frag.trim());

    let year = text
        .rsplit_once(',')
        .map(|(_, y)| y.trim())
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| bad("no trailing year"))?;

    let start_tokens: Vec<&str> = start_frag.split_whitespace().collect();
    let [start_month, start_day] = start_tokens.as_slice() else {
        return Err(bad("start must be '<Month> <Day>'"));
    };

    let (end_month, end_day) = match end_frag.split_once(',') {
        Some((before, _)) => {
            let tokens: Vec<&str> = before.split_whitespace().collect();
            match tokens.as_slice() {
                [month, day] => (*month, *day),
                [day] => (*start_month, *day),
                _ => return Err(bad("end must be '<Month> <Day>' or '<Day>'")),
            }
        }
        None => {
            let tokens: Vec<&str> = end_frag.split_whitespace().collect();
            match tokens.as_slice() {
                [day] => (*start_month, *day),
                _ => return Err(bad("end without year must be '<Day>'")),
            }
        }
    };

    let start = calendar_date(start_month, start_day, year).ok_or_else(|| bad("invalid start date"))?;
    let end = calendar_date(end_month, end_day, year).ok_or_else(|| bad("invalid end date"))?;
    if start > end {
        return Err(bad("start falls after end"));
    }
    Ok((start, end))
}

fn calendar_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {} {}", month, day, year), "%b %d %Y").ok()
}

// ---------------------------------------------------------------------------
// Listing rows
// ---------------------------------------------------------------------------

/// Result of parsing one tournament listing page.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub rows_seen: usize,
    pub candidates: usize,
    pub events: Vec<EventRecord>,
}

/// Parse every listing row mentioning one of `years`.
pub fn parse_event_page(html: &str, years: &[i32]) -> Result<EventPage> {
    let doc = Html::parse_document(html);
    let rows = selector(ROW_SELECTOR)?;
    let header = selector(HEADER_SELECTOR)?;
    let link = selector(&format!(r#"a[href*="{}"]"#, EVENT_LINK_PATH))?;
    let flag = selector(FLAG_SELECTOR)?;
    let date_re = date_pattern(years)?;
    let prize_re = Regex::new(PRIZE_PATTERN).map_err(|e| TrackerError::Parse(e.to_string()))?;
    let year_tags: Vec<String> = years.iter().map(|y| y.to_string()).collect();

    let mut page = EventPage::default();
    for row in doc.select(&rows) {
        page.rows_seen += 1;
        let text = row_text(row);
        if !year_tags.iter().any(|y| text.contains(y.as_str())) {
            continue;
        }
        page.candidates += 1;

        let Some(name) = tournament_name(row, &header, &link) else {
            debug!(row = text.as_str(), "skipping row without tournament name");
            continue;
        };
        let Some(date_range) = date_re.captures(&text).and_then(|c| c.get(1)) else {
            debug!(name = name.as_str(), "skipping row without date pattern");
            continue;
        };
        let date_range = date_range.as_str().to_string();
        let (start_date, end_date) = match parse_date_range(&date_range) {
            Ok(pair) => pair,
            Err(e) => {
                debug!(name = name.as_str(), error = %e, "skipping row");
                continue;
            }
        };

        let prize_pool = prize_re
            .find(&text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let location = row
            .select(&flag)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map(|alt| alt.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        page.events.push(EventRecord {
            tournament_name: name,
            start_date,
            end_date,
            date_range,
            prize_pool,
            location,
        });
    }
    Ok(page)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TrackerError::Parse(format!("invalid selector {}: {}", css, e)))
}

fn date_pattern(years: &[i32]) -> Result<Regex> {
    if years.is_empty() {
        return Err(TrackerError::InvalidArgument("no target years".into()));
    }
    let alternatives: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    let pattern = format!(
        r"([A-Z][a-z]{{2}}\s+\d{{1,2}}(?:\s*-\s*(?:[A-Z][a-z]{{2}}\s+)?\d{{1,2}})?,\s*(?:{}))",
        alternatives.join("|")
    );
    Regex::new(&pattern).map_err(|e| TrackerError::Parse(e.to_string()))
}

/// Trimmed, non-empty text nodes joined with `|`.
fn row_text(row: ElementRef<'_>) -> String {
    row.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

/// The last header link whose text is longer than three characters.
fn tournament_name(row: ElementRef<'_>, header: &Selector, link: &Selector) -> Option<String> {
    let header = row.select(header).next()?;
    header
        .select(link)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|t| t.chars().count() > 3)
        .last()
}

// ---------------------------------------------------------------------------
// Window + output
// ---------------------------------------------------------------------------

/// Keep events still running on or after the cutoff day, ordered by start.
pub fn filter_window(events: Vec<EventRecord>, window: &RollingWindow) -> Vec<EventRecord> {
    let cutoff = window.cutoff().date();
    let mut kept: Vec<EventRecord> = events.into_iter().filter(|e| e.end_date >= cutoff).collect();
    kept.sort_by_key(|e| e.start_date);
    kept
}

const EVENT_CSV_HEADER: &[&str] = &[
    "tournament_name",
    "start_date",
    "end_date",
    "date_range",
    "prize_pool",
    "location",
];

#[derive(Serialize)]
struct EventCsvRow<'a> {
    tournament_name: &'a str,
    start_date: String,
    end_date: String,
    date_range: &'a str,
    prize_pool: &'a str,
    location: &'a str,
}

/// Write the event table in one atomic replace.
pub fn write_events_csv(path: &Path, events: &[EventRecord]) -> Result<()> {
    write_csv_atomic(
        path,
        EVENT_CSV_HEADER,
        events.iter().map(|e| EventCsvRow {
            tournament_name: &e.tournament_name,
            start_date: e.start_date.format(EVENT_DATE_FORMAT).to_string(),
            end_date: e.end_date.format(EVENT_DATE_FORMAT).to_string(),
            date_range: &e.date_range,
            prize_pool: &e.prize_pool,
            location: &e.location,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cross_month_range() {
        let (s, e) = parse_date_range("Nov 24 - Dec 14, 2025").unwrap();
        assert_eq!((s, e), (ymd(2025, 11, 24), ymd(2025, 12, 14)));
    }

    #[test]
    fn same_month_range_inherits_month() {
        assert_eq!(
            parse_date_range("Jan 22 - 28, 2024").unwrap(),
            (ymd(2024, 1, 22), ymd(2024, 1, 28))
        );
        assert_eq!(
            parse_date_range("Nov 19 - 23, 2025").unwrap(),
            (ymd(2025, 11, 19), ymd(2025, 11, 23))
        );
    }

    #[test]
    fn shapes_outside_the_rules_fail() {
        assert!(parse_date_range("Nov 24, 2025").is_err());
        assert!(parse_date_range("Nov 24 - Dec 14").is_err());
        assert!(parse_date_range("Nov 24 - Dec 14 15, 2025").is_err());
        assert!(parse_date_range("Feb 30 - Mar 2, 2025").is_err());
        assert!(parse_date_range("Dec 14 - Nov 24, 2025").is_err());
        assert!(parse_date_range("").is_err());
    }

    #[test]
    fn date_pattern_respects_years() {
        let re = date_pattern(&[2024, 2025]).unwrap();
        let text = "IEM Cologne|Jun 2 - 22, 2025|$1,250,000";
        assert_eq!(&re.captures(text).unwrap()[1], "Jun 2 - 22, 2025");
        assert!(re.captures("Jun 2 - 22, 2019").is_none());
        assert!(date_pattern(&[]).is_err());
    }
}
