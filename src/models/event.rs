use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventRecord — One scheduled tournament
// ---------------------------------------------------------------------------

/// A tournament row resolved to concrete dates.
///
/// `start_date <= end_date` holds for every record built by the parser.
/// `prize_pool` and `location` carry `"Unknown"` when the row lacks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub tournament_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub date_range: String,
    pub prize_pool: String,
    pub location: String,
}
