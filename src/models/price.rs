use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceObservation — Single accepted price data point
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub item_name: String,
    pub date: NaiveDateTime,
    pub price: f64,
    pub volume: i64,
}

impl PriceObservation {
    /// Ordering key of the price table: entry first, then time.
    pub fn sort_key(&self) -> (&str, NaiveDateTime) {
        (self.item_name.as_str(), self.date)
    }
}

// ---------------------------------------------------------------------------
// PriceTrend — Aggregated price data for one entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceTrend {
    pub item_name: String,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub first_date: NaiveDateTime,
    pub last_date: NaiveDateTime,
    pub data_points: usize,
}

// ---------------------------------------------------------------------------
// TableStats — Whole-table summary reported at the end of a run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableStats {
    pub records: usize,
    pub unique_items: usize,
    pub first_date: NaiveDateTime,
    pub last_date: NaiveDateTime,
    pub min_price: f64,
    pub max_price: f64,
}
