//! Rate-limit-aware page fetching.
//!
//! [`Fetcher`] wraps a [`Transport`] with the backoff rules in
//! [`RetryPolicy`]: a 429 answer is retried after a growing wait until the
//! retry ceiling is hit, any other non-success status fails immediately,
//! and every successful fetch is followed by a short randomized cooldown.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::{DelayRange, RetryPolicy, STEAM_BASE};
use crate::error::{Result, TrackerError};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Raw answer to a GET: status plus body text.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// Performs a single GET. Network-level failures are `Err`; any HTTP
/// status, including errors, is an `Ok(RawResponse)`.
pub trait Transport: Send {
    fn get(&self, url: &str) -> Result<RawResponse>;
}

/// Blocking `reqwest` transport with browser-like request headers.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(REFERER, HeaderValue::from_static("https://steamcommunity.com/"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        Ok(RawResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// Every timed pause in a run goes through this seam.
pub trait Sleeper: Send {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Retry/backoff state machine over a [`Transport`].
///
/// `fetch` ends in exactly one of two states: the page body, or an error
/// meaning the page is unavailable for this run.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
    cooldown: DelayRange,
}

impl Fetcher {
    pub fn new(
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
        cooldown: DelayRange,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            cooldown,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Pause for a duration drawn from `range`.
    pub fn pause(&self, range: DelayRange) -> Duration {
        let d = range.sample(&mut rand::thread_rng());
        self.sleeper.sleep(d);
        d
    }

    /// Fetch `url`, backing off on 429 up to `max_retries` times.
    pub fn fetch(&self, url: &str) -> Result<String> {
        let mut retry_count = 0;
        loop {
            let resp = self.transport.get(url)?;

            if resp.status == StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= self.policy.max_retries {
                    warn!(url, retries = retry_count, "rate limited; retry ceiling reached");
                    return Err(TrackerError::Throttled {
                        url: url.to_string(),
                        attempts: retry_count,
                    });
                }
                let wait = self.policy.backoff(retry_count);
                warn!(url, wait_secs = wait.as_secs(), "rate limited (429); backing off");
                self.sleeper.sleep(wait);
                retry_count += 1;
                continue;
            }

            if !resp.status.is_success() {
                warn!(url, status = %resp.status, "request failed");
                return Err(TrackerError::HttpStatus {
                    status: resp.status,
                    url: url.to_string(),
                });
            }

            let cooled = self.pause(self.cooldown);
            debug!(url, bytes = resp.body.len(), cooldown_ms = cooled.as_millis() as u64, "fetched");
            return Ok(resp.body);
        }
    }
}

/// Turn an href from a listing page into an absolute URL.
pub fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("{}{}", STEAM_BASE, href)
    } else {
        format!("{}/{}", STEAM_BASE, href)
    }
}
