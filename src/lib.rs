//! Steam weapon case price history and tournament calendar collector.
//!
//! Gathers two time-indexed datasets for later correlation: the trailing
//! year of Steam Community Market sale history for every listing on a set of
//! search pages, and the S-Tier Counter-Strike tournament calendar from
//! Liquipedia. Runs are strictly sequential and rate-limit aware, and the
//! price table is persisted after every entry so an interrupted run keeps
//! its progress.
//!
//! # Quick start
//!
//! ```no_run
//! use steam_case_tracker::{config, CaseTracker};
//!
//! let tracker = CaseTracker::builder().output_dir("data").build().unwrap();
//!
//! // Price history for every weapon case on the default search pages
//! let prices = tracker.collect_prices(&config::default_catalog_pages(), None).unwrap();
//!
//! // Tournaments of the last year
//! let events = tracker.collect_events(config::EVENTS_URL, None).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod pipeline;

#[cfg(feature = "async")]
pub use async_client::AsyncCaseTracker;
pub use aggregate::{CsvSnapshotSink, PriceTable, SnapshotSink};
pub use config::{DelayRange, RetryPolicy, RollingWindow};
pub use error::{Result, TrackerError};
pub use fetcher::{Fetcher, HttpTransport, RawResponse, Sleeper, ThreadSleeper, Transport};
pub use pipeline::{EventRunSummary, PriceRunSummary, SkippedEntry};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

// ---------------------------------------------------------------------------
// CaseTrackerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CaseTracker`].
///
/// Every value is frozen at [`build()`](CaseTrackerBuilder::build); nothing
/// about pacing or retries changes during a run.
pub struct CaseTrackerBuilder {
    output_dir: PathBuf,
    timeout: Duration,
    user_agent: String,
    app_id: u32,
    retry_policy: RetryPolicy,
    cooldown: DelayRange,
    page_delay: DelayRange,
    entry_delay: DelayRange,
    transport: Option<Box<dyn Transport>>,
    sleeper: Option<Box<dyn Sleeper>>,
}

impl Default for CaseTrackerBuilder {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            timeout: Duration::from_secs(20),
            user_agent: config::USER_AGENT.to_string(),
            app_id: config::DEFAULT_APP_ID,
            retry_policy: RetryPolicy::default(),
            cooldown: DelayRange::new(1.0, 2.0),
            page_delay: DelayRange::new(10.0, 15.0),
            entry_delay: DelayRange::new(5.0, 10.0),
            transport: None,
            sleeper: None,
        }
    }
}

impl CaseTrackerBuilder {
    /// Directory output files are written to. Created on build.
    ///
    /// Defaults to the current directory.
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    /// Per-request timeout. A timed-out request is a failure, not a retry.
    ///
    /// Defaults to 20 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Steam app whose market listings are enumerated. Defaults to 730.
    pub fn app_id(mut self, app_id: u32) -> Self {
        self.app_id = app_id;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Pause after every successful fetch. Defaults to 1-2 seconds.
    pub fn cooldown(mut self, range: DelayRange) -> Self {
        self.cooldown = range;
        self
    }

    /// Pause between listing pages. Defaults to 10-15 seconds.
    pub fn page_delay(mut self, range: DelayRange) -> Self {
        self.page_delay = range;
        self
    }

    /// Pause between catalog entries. Defaults to 5-10 seconds.
    pub fn entry_delay(mut self, range: DelayRange) -> Self {
        self.entry_delay = range;
        self
    }

    /// Zero every randomized pause. Backoff waits still go to the sleeper.
    pub fn no_delays(self) -> Self {
        self.cooldown(DelayRange::ZERO)
            .page_delay(DelayRange::ZERO)
            .entry_delay(DelayRange::ZERO)
    }

    /// Replace the HTTP transport (the `timeout` and `user_agent` settings
    /// then no longer apply).
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Some(Box::new(sleeper));
        self
    }

    pub fn build(self) -> Result<CaseTracker> {
        fs::create_dir_all(&self.output_dir)?;

        let transport: Box<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Box::new(HttpTransport::new(&self.user_agent, self.timeout)?),
        };
        let sleeper: Box<dyn Sleeper> = match self.sleeper {
            Some(s) => s,
            None => Box::new(ThreadSleeper),
        };

        Ok(CaseTracker {
            fetcher: Fetcher::new(transport, sleeper, self.retry_policy, self.cooldown),
            output_dir: self.output_dir,
            app_id: self.app_id,
            page_delay: self.page_delay,
            entry_delay: self.entry_delay,
        })
    }
}

// ---------------------------------------------------------------------------
// CaseTracker
// ---------------------------------------------------------------------------

/// Entry point for both acquisition pipelines.
///
/// Created via [`CaseTracker::builder()`].
pub struct CaseTracker {
    fetcher: Fetcher,
    output_dir: PathBuf,
    app_id: u32,
    page_delay: DelayRange,
    entry_delay: DelayRange,
}

impl CaseTracker {
    pub fn builder() -> CaseTrackerBuilder {
        CaseTrackerBuilder::default()
    }

    /// Access the catalog enumerator.
    pub fn catalog(&self) -> catalog::CatalogQuery<'_> {
        catalog::CatalogQuery::new(&self.fetcher, self.app_id, self.page_delay)
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    // -- Prices -------------------------------------------------------------

    /// Enumerate `pages`, then collect and persist price history per entry.
    ///
    /// `output` defaults to a timestamped file in the output directory; a
    /// relative path is taken relative to it. The file is only created once
    /// the first entry yields data.
    pub fn collect_prices(&self, pages: &[String], output: Option<&Path>) -> Result<PriceRunSummary> {
        let window = RollingWindow::starting_now();
        let path = config::resolve_output(
            &self.output_dir,
            output,
            config::default_price_filename(window.started_at()),
        );
        info!(
            pages = pages.len(),
            cutoff = %window.cutoff().date(),
            output = %path.display(),
            "starting price run"
        );

        let mut sink = CsvSnapshotSink::new(&path);
        let mut summary = self.collect_prices_into(pages, &window, &mut sink)?;
        if summary.records > 0 {
            summary.output = Some(path);
        }
        Ok(summary)
    }

    /// Like [`collect_prices`](Self::collect_prices) with an explicit window
    /// and sink.
    pub fn collect_prices_into(
        &self,
        pages: &[String],
        window: &RollingWindow,
        sink: &mut dyn SnapshotSink,
    ) -> Result<PriceRunSummary> {
        let entries = self.catalog().enumerate(pages);
        if entries.is_empty() {
            info!("no catalog entries found");
        } else {
            info!(entries = entries.len(), "unique entries collected");
        }
        pipeline::harvest_prices(&self.fetcher, &entries, window, self.entry_delay, sink)
    }

    // -- Events -------------------------------------------------------------

    /// Scrape the tournament listing at `url` and write window events.
    ///
    /// Target years are the calendar years the window touches. No file is
    /// written when no event survives.
    pub fn collect_events(&self, url: &str, output: Option<&Path>) -> Result<EventRunSummary> {
        let window = RollingWindow::starting_now();
        let path = config::resolve_output(
            &self.output_dir,
            output,
            config::default_event_filename(window.started_at()),
        );

        let mut summary = self.events_in_window(url, &window, &window.years())?;
        if summary.events.is_empty() {
            info!("no tournaments inside the window");
        } else {
            events::write_events_csv(&path, &summary.events)?;
            info!(events = summary.events.len(), output = %path.display(), "tournaments saved");
            summary.output = Some(path);
        }
        Ok(summary)
    }

    /// Scrape and window-filter events without writing anything.
    pub fn events_in_window(
        &self,
        url: &str,
        window: &RollingWindow,
        years: &[i32],
    ) -> Result<EventRunSummary> {
        pipeline::harvest_events(&self.fetcher, url, window, years)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CaseTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = self.fetcher.policy();
        write!(
            f,
            "CaseTracker(output_dir={}, app_id={}, max_retries={}, base_backoff={}s)",
            self.output_dir.display(),
            self.app_id,
            policy.max_retries,
            policy.base_backoff.as_secs()
        )
    }
}
