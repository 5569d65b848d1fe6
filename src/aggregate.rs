//! Incremental accumulation and crash-safe persistence of price data.
//!
//! [`PriceTable`] holds every accepted observation of a run, kept sorted by
//! `(item_name, date)`. [`Aggregator`] pushes the full table to a
//! [`SnapshotSink`] after each successfully processed entry, so an
//! interrupted run always leaves the last complete snapshot behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::PRICE_DATE_FORMAT;
use crate::error::Result;
use crate::models::{PriceObservation, PriceTrend, TableStats};

// ---------------------------------------------------------------------------
// PriceTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    rows: Vec<PriceObservation>,
    scraped: Vec<String>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry's observations and restore table order.
    ///
    /// Exact `(item_name, date)` repeats collapse to the first one seen.
    pub fn add_entry(&mut self, item_name: &str, observations: Vec<PriceObservation>) {
        self.rows.extend(observations);
        self.scraped.push(item_name.to_string());
        self.normalize();
    }

    fn normalize(&mut self) {
        self.rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.rows.dedup_by(|later, earlier| later.sort_key() == earlier.sort_key());
    }

    pub fn rows(&self) -> &[PriceObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names of entries that contributed data, in processing order.
    pub fn scraped_items(&self) -> &[String] {
        &self.scraped
    }

    /// Per-item min/max/avg and date span, ordered by item name.
    pub fn trends(&self) -> Vec<PriceTrend> {
        let mut groups: BTreeMap<&str, Vec<&PriceObservation>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.item_name.as_str()).or_default().push(row);
        }

        groups
            .into_iter()
            .filter_map(|(name, rows)| {
                let first = rows.first()?;
                let last = rows.last()?;
                let sum: f64 = rows.iter().map(|r| r.price).sum();
                Some(PriceTrend {
                    item_name: name.to_string(),
                    min_price: rows.iter().map(|r| r.price).fold(f64::INFINITY, f64::min),
                    max_price: rows.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max),
                    avg_price: sum / rows.len() as f64,
                    first_date: first.date,
                    last_date: last.date,
                    data_points: rows.len(),
                })
            })
            .collect()
    }

    /// Whole-table summary, `None` when empty.
    pub fn stats(&self) -> Option<TableStats> {
        let first = self.rows.iter().map(|r| r.date).min()?;
        let last = self.rows.iter().map(|r| r.date).max()?;
        let mut names: Vec<&str> = self.rows.iter().map(|r| r.item_name.as_str()).collect();
        names.dedup();
        Some(TableStats {
            records: self.rows.len(),
            unique_items: names.len(),
            first_date: first,
            last_date: last,
            min_price: self.rows.iter().map(|r| r.price).fold(f64::INFINITY, f64::min),
            max_price: self.rows.iter().map(|r| r.price).fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

// ---------------------------------------------------------------------------
// SnapshotSink
// ---------------------------------------------------------------------------

/// Receives the full, ordered table. Each call replaces the previous snapshot.
pub trait SnapshotSink {
    fn write_snapshot(&mut self, rows: &[PriceObservation]) -> Result<()>;
}

/// Writes snapshots as CSV (`item_name,date,price`) with replace-on-rename.
#[derive(Debug, Clone)]
pub struct CsvSnapshotSink {
    path: PathBuf,
}

impl CsvSnapshotSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

const PRICE_CSV_HEADER: &[&str] = &["item_name", "date", "price"];

#[derive(Serialize)]
struct PriceCsvRow<'a> {
    item_name: &'a str,
    date: String,
    price: f64,
}

impl SnapshotSink for CsvSnapshotSink {
    fn write_snapshot(&mut self, rows: &[PriceObservation]) -> Result<()> {
        write_csv_atomic(
            &self.path,
            PRICE_CSV_HEADER,
            rows.iter().map(|r| PriceCsvRow {
                item_name: &r.item_name,
                date: r.date.format(PRICE_DATE_FORMAT).to_string(),
                price: r.price,
            }),
        )
    }
}

/// Serialize `header` then `rows` to a temp file beside `path`, then rename
/// it over `path`. Readers never observe a half-written file, and an empty
/// table still yields its header row.
pub fn write_csv_atomic<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        wtr.write_record(header)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Couples a [`PriceTable`] with the sink that mirrors it.
pub struct Aggregator<'s> {
    table: PriceTable,
    sink: &'s mut dyn SnapshotSink,
}

impl<'s> Aggregator<'s> {
    pub fn new(sink: &'s mut dyn SnapshotSink) -> Self {
        Self {
            table: PriceTable::new(),
            sink,
        }
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// Record a successful entry and immediately persist the whole table.
    pub fn accept(&mut self, item_name: &str, observations: Vec<PriceObservation>) -> Result<()> {
        if observations.is_empty() {
            return Ok(());
        }
        let added = observations.len();
        self.table.add_entry(item_name, observations);
        self.sink.write_snapshot(self.table.rows())?;
        info!(
            item = item_name,
            added,
            items = self.table.scraped_items().len(),
            records = self.table.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Final write with the same overwrite semantics; skipped when empty.
    pub fn finish(mut self) -> Result<PriceTable> {
        if !self.table.is_empty() {
            self.sink.write_snapshot(self.table.rows())?;
            debug!(records = self.table.len(), "final snapshot saved");
        }
        Ok(self.table)
    }
}
