//! Collector - paginated fetching of raw records
//!
//! The collector walks pages 1..=max_pages of a `PageSource` and stops at
//! the first empty page, at the page cap, or at the first failed request.
//! Records gathered before a failure are kept.

pub mod http;

use crate::Result;
use crate::record::RawRecord;

pub use http::HttpPageSource;

/// Default number of records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default maximum number of page requests per collection run
pub const DEFAULT_MAX_PAGES: u32 = 25;

/// A paginated source of raw records.
///
/// Pages are 1-based. Returning an empty vector signals end of data; an
/// error aborts the collection run.
pub trait PageSource: Send {
    fn fetch_page(&self, category: &str, page: u32, page_size: u32) -> Result<Vec<RawRecord>>;
}

/// Why a collection run stopped
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no records
    Exhausted,
    /// The configured page cap was reached
    PageCap,
    /// A request failed; earlier pages were kept
    RemoteUnavailable(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "source exhausted"),
            StopReason::PageCap => write!(f, "page cap reached"),
            StopReason::RemoteUnavailable(msg) => write!(f, "remote unavailable: {}", msg),
        }
    }
}

/// Output of one collection run
#[derive(Debug)]
pub struct Collection {
    pub records: Vec<RawRecord>,
    /// Number of page requests issued, including the one that ended the run
    pub requests: u32,
    pub stop: StopReason,
}

impl Collection {
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::RemoteUnavailable(_))
    }
}

/// Progress notification emitted after each successful page
#[derive(Debug, Clone, Copy)]
pub struct PageProgress {
    pub page: u32,
    pub max_pages: u32,
    pub page_records: usize,
    pub total_records: usize,
}

/// Paginating collector over a borrowed page source
pub struct Collector<'a> {
    source: &'a dyn PageSource,
    page_size: u32,
    max_pages: u32,
}

impl<'a> Collector<'a> {
    pub fn new(source: &'a dyn PageSource, page_size: u32, max_pages: u32) -> Self {
        Self {
            source,
            page_size,
            max_pages,
        }
    }

    /// Collect every page for a category
    pub fn collect(&self, category: &str) -> Collection {
        self.collect_with(category, &mut |_| {})
    }

    /// Collect every page for a category, reporting each fetched page
    pub fn collect_with(
        &self,
        category: &str,
        on_page: &mut dyn FnMut(PageProgress),
    ) -> Collection {
        let mut records = Vec::new();
        let mut requests = 0;

        for page in 1..=self.max_pages {
            requests += 1;
            tracing::debug!("Requesting {} page {} (size {})", category, page, self.page_size);

            let page_records = match self.source.fetch_page(category, page, self.page_size) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        "Collection of {} aborted at page {}: {} ({} records kept)",
                        category,
                        page,
                        e,
                        records.len()
                    );
                    return Collection {
                        records,
                        requests,
                        stop: StopReason::RemoteUnavailable(e.to_string()),
                    };
                }
            };

            if page_records.is_empty() {
                tracing::info!("{}: page {} empty, {} records collected", category, page, records.len());
                return Collection {
                    records,
                    requests,
                    stop: StopReason::Exhausted,
                };
            }

            let page_len = page_records.len();
            records.extend(page_records);
            tracing::info!("{}: page {} returned {} records", category, page, page_len);

            on_page(PageProgress {
                page,
                max_pages: self.max_pages,
                page_records: page_len,
                total_records: records.len(),
            });
        }

        tracing::info!(
            "{}: page cap of {} reached, {} records collected",
            category,
            self.max_pages,
            records.len()
        );
        Collection {
            records,
            requests,
            stop: StopReason::PageCap,
        }
    }
}
