use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDateTime, Utc};
use rand::Rng;

pub const STEAM_BASE: &str = "https://steamcommunity.com";
pub const LISTINGS_PATH: &str = "/market/listings/";
pub const DEFAULT_APP_ID: u32 = 730;

pub const EVENTS_URL: &str = "https://liquipedia.net/counterstrike/S-Tier_Tournaments";
pub const EVENT_LINK_PATH: &str = "/counterstrike/";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Embedded price history assignment on a market listing page.
pub const PRICE_MARKER: &str = r"(?s)var line1=(\[\[.*?\]\]);";

/// Days covered by the rolling window.
pub const WINDOW_DAYS: i64 = 365;

/// Price CSV timestamp rendering.
pub const PRICE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Event CSV date rendering.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

pub const UNKNOWN: &str = "Unknown";

/// Weapon case search pages, ten results each.
pub fn default_catalog_pages() -> Vec<String> {
    (0..5)
        .map(|page| {
            format!(
                "{}/market/search?appid={}&category_730_Type%5B%5D=tag_CSGO_Type_WeaponCase&start={}",
                STEAM_BASE,
                DEFAULT_APP_ID,
                page * 10
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DelayRange
// ---------------------------------------------------------------------------

/// Inclusive range of seconds a randomized pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min_secs: 0.0,
        max_secs: 0.0,
    };

    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Draw a duration uniformly from the range.
    ///
    /// A reversed range is treated as its swapped counterpart; negative
    /// bounds clamp to zero.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min_secs.min(self.max_secs).max(0.0);
        let hi = self.min_secs.max(self.max_secs).max(0.0);
        if hi <= lo {
            return Duration::from_secs_f64(lo);
        }
        Duration::from_secs_f64(rng.gen_range(lo..=hi))
    }

    pub fn contains(&self, d: Duration) -> bool {
        let secs = d.as_secs_f64();
        secs >= self.min_secs && secs <= self.max_secs
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Backoff rules applied when the remote side answers 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry_count + 1`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        self.base_backoff * (retry_count + 1)
    }
}

// ---------------------------------------------------------------------------
// RollingWindow
// ---------------------------------------------------------------------------

/// Trailing 365-day window anchored at the start of a run.
///
/// Computed once per run and shared by every filtering step of that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    started_at: NaiveDateTime,
    cutoff: NaiveDateTime,
}

impl RollingWindow {
    pub fn starting_now() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(started_at: DateTime<Utc>) -> Self {
        let started_at = started_at.naive_utc();
        Self {
            started_at,
            cutoff: started_at - ChronoDuration::days(WINDOW_DAYS),
        }
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.cutoff
    }

    /// Calendar years the window touches, oldest first.
    pub fn years(&self) -> Vec<i32> {
        (self.cutoff.year()..=self.started_at.year()).collect()
    }
}

// ---------------------------------------------------------------------------
// Output naming
// ---------------------------------------------------------------------------

pub fn default_price_filename(at: NaiveDateTime) -> String {
    format!("steam_weapon_cases_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn default_event_filename(at: NaiveDateTime) -> String {
    format!(
        "csgo_stier_tournaments_last_year_{}.csv",
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Resolve an explicit output path, or fall back to `dir/default_name`.
pub fn resolve_output(dir: &Path, explicit: Option<&Path>, default_name: String) -> PathBuf {
    match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => dir.join(p),
        None => dir.join(default_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backoff_grows_linearly_with_retry_count() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(60));
        assert_eq!(policy.backoff(1), Duration::from_secs(120));
        assert_eq!(policy.backoff(2), Duration::from_secs(180));
    }

    #[test]
    fn delay_sample_stays_in_range() {
        let range = DelayRange::new(1.0, 2.0);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(DelayRange::ZERO.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn window_spans_two_years() {
        let w = RollingWindow::anchored_at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        assert_eq!(w.cutoff().to_string(), "2024-06-01 12:00:00");
        assert_eq!(w.years(), vec![2024, 2025]);
    }

    #[test]
    fn filenames_embed_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap().naive_utc();
        assert_eq!(default_price_filename(at), "steam_weapon_cases_20250102_030405.csv");
        assert!(default_event_filename(at).ends_with("_20250102_030405.csv"));
    }
}
