//! Async wrapper around [`CaseTracker`] for use in async runtimes (Tokio, etc.).
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]. Runs are dominated by deliberate sleeps
//! and blocking HTTP, so they must never execute on the event loop itself.
//!
//! # Example
//!
//! ```no_run
//! use steam_case_tracker::{config, AsyncCaseTracker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let tracker = AsyncCaseTracker::builder().build().await.unwrap();
//!
//!     let summary = tracker
//!         .collect_events(config::EVENTS_URL.to_string(), None)
//!         .await
//!         .unwrap();
//!     println!("{} tournaments", summary.events.len());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Result, TrackerError};
use crate::pipeline::{EventRunSummary, PriceRunSummary};
use crate::CaseTracker;

// ---------------------------------------------------------------------------
// AsyncCaseTrackerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncCaseTracker`].
pub struct AsyncCaseTrackerBuilder {
    output_dir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for AsyncCaseTrackerBuilder {
    fn default() -> Self {
        Self {
            output_dir: None,
            timeout: Duration::from_secs(20),
        }
    }
}

impl AsyncCaseTrackerBuilder {
    /// Set the directory output files are written to.
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the tracker on the blocking pool.
    pub async fn build(self) -> Result<AsyncCaseTracker> {
        tokio::task::spawn_blocking(move || {
            let mut builder = CaseTracker::builder().timeout(self.timeout);
            if let Some(dir) = self.output_dir {
                builder = builder.output_dir(dir);
            }
            let tracker = builder.build()?;
            Ok(AsyncCaseTracker::from_tracker(tracker))
        })
        .await
        .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncCaseTracker
// ---------------------------------------------------------------------------

/// Async wrapper around [`CaseTracker`].
///
/// The tracker sits behind a [`Mutex`], so concurrent calls are serialized
/// and runs stay strictly sequential.
pub struct AsyncCaseTracker {
    inner: Arc<Mutex<CaseTracker>>,
}

impl AsyncCaseTracker {
    pub fn builder() -> AsyncCaseTrackerBuilder {
        AsyncCaseTrackerBuilder::default()
    }

    /// Wrap an already configured blocking tracker.
    pub fn from_tracker(tracker: CaseTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Run a blocking tracker operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CaseTracker) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tracker = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = tracker
                .lock()
                .map_err(|_| TrackerError::InvalidArgument("tracker lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| TrackerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Async counterpart of [`CaseTracker::collect_prices`].
    pub async fn collect_prices(
        &self,
        pages: Vec<String>,
        output: Option<PathBuf>,
    ) -> Result<PriceRunSummary> {
        self.run(move |t| t.collect_prices(&pages, output.as_deref())).await
    }

    /// Async counterpart of [`CaseTracker::collect_events`].
    pub async fn collect_events(
        &self,
        url: String,
        output: Option<PathBuf>,
    ) -> Result<EventRunSummary> {
        self.run(move |t| t.collect_events(&url, output.as_deref())).await
    }
}
