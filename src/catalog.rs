//! Catalog enumeration across paginated market search pages.

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::config::{DelayRange, LISTINGS_PATH};
use crate::error::{Result, TrackerError};
use crate::fetcher::{absolute_url, Fetcher};
use crate::models::EntryRef;

const ROW_LINK_SELECTOR: &str = "a.market_listing_row_link";
const FALLBACK_SELECTOR: &str = r#"a[href*="/market/listings/"]"#;

// ---------------------------------------------------------------------------
// CatalogQuery
// ---------------------------------------------------------------------------

/// Walks listing pages and collects unique [`EntryRef`]s.
pub struct CatalogQuery<'a> {
    fetcher: &'a Fetcher,
    app_id: u32,
    page_delay: DelayRange,
}

impl<'a> CatalogQuery<'a> {
    pub fn new(fetcher: &'a Fetcher, app_id: u32, page_delay: DelayRange) -> Self {
        Self {
            fetcher,
            app_id,
            page_delay,
        }
    }

    /// Fetch one listing page and parse its entries.
    ///
    /// A page that cannot be fetched yields no entries.
    pub fn page(&self, url: &str) -> Vec<EntryRef> {
        match self.fetcher.fetch(url) {
            Ok(html) => parse_listing_page(&html, self.app_id),
            Err(e) => {
                warn!(url, error = %e, "listing page unavailable; no entries taken from it");
                Vec::new()
            }
        }
    }

    /// Enumerate all pages in order, keeping the first occurrence of each name.
    pub fn enumerate(&self, pages: &[String]) -> Vec<EntryRef> {
        let mut all = Vec::new();
        let mut seen = HashSet::new();

        for (idx, url) in pages.iter().enumerate() {
            info!(page = idx + 1, of = pages.len(), url = url.as_str(), "fetching listing page");
            let entries = self.page(url);
            let found = entries.len();
            let added = merge_unique(&mut all, &mut seen, entries);
            info!(found, added, total = all.len(), "listing page done");

            if idx + 1 < pages.len() {
                let waited = self.fetcher.pause(self.page_delay);
                debug!(wait_secs = waited.as_secs_f64(), "paused before next page");
            }
        }
        all
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract entries from a listing page, falling back to any listings link
/// when the row selector matches nothing.
pub fn parse_listing_page(html: &str, app_id: u32) -> Vec<EntryRef> {
    let doc = Html::parse_document(html);

    let hrefs = match select_hrefs(&doc, ROW_LINK_SELECTOR) {
        Ok(h) if !h.is_empty() => h,
        _ => {
            debug!("no row links found; trying fallback selector");
            select_hrefs(&doc, FALLBACK_SELECTOR).unwrap_or_default()
        }
    };

    let mut entries = Vec::with_capacity(hrefs.len());
    for href in hrefs {
        match entry_from_href(&href, app_id) {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!(href = href.as_str(), error = %e, "skipping anchor"),
        }
    }
    entries
}

fn select_hrefs(doc: &Html, css: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(css)
        .map_err(|e| TrackerError::Parse(format!("invalid selector {}: {}", css, e)))?;
    Ok(doc
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|s| s.to_string())
        .collect())
}

/// Derive an entry from a listing link.
///
/// The name is the path segment after `/market/listings/<app_id>/`, with the
/// query and fragment removed before percent-decoding.
pub fn entry_from_href(href: &str, app_id: u32) -> Result<EntryRef> {
    let marker = format!("{}{}/", LISTINGS_PATH, app_id);
    let (_, tail) = href
        .split_once(&marker)
        .ok_or_else(|| TrackerError::Parse(format!("not a listing link for app {}", app_id)))?;

    let raw = tail.split(['?', '#']).next().unwrap_or("");
    let name = urlencoding::decode(raw)
        .map_err(|e| TrackerError::Parse(format!("bad percent-encoding: {}", e)))?
        .trim()
        .to_string();
    if name.is_empty() {
        return Err(TrackerError::Parse("empty listing name".into()));
    }

    Ok(EntryRef::new(name, absolute_url(href)))
}

/// Append `page` entries to `all`, skipping names already seen.
///
/// Returns how many entries were added.
pub fn merge_unique(
    all: &mut Vec<EntryRef>,
    seen: &mut HashSet<String>,
    page: Vec<EntryRef>,
) -> usize {
    let before = all.len();
    for entry in page {
        if seen.insert(entry.name.clone()) {
            all.push(entry);
        }
    }
    all.len() - before
}
