//! Page-by-page entry collection
//!
//! Pages are fetched strictly in order. A page that cannot be fetched is
//! skipped and reported; it never stops the run.

use crate::config::DelayWindow;
use crate::crawler::fetcher::PageSource;
use crate::crawler::parser::EntryParser;
use crate::url::ThreadUrl;
use crate::FetchError;
use std::time::Instant;
use thiserror::Error;

/// A page whose fetch failed during collection
#[derive(Debug, Error)]
#[error("page {page} skipped: {source}")]
pub struct PageSkipped {
    pub page: u32,
    #[source]
    pub source: FetchError,
}

/// Everything gathered over pages `1..=last_page`
#[derive(Debug, Default)]
pub struct CollectionReport {
    /// Entries in page order, then document order within a page
    pub entries: Vec<String>,

    /// Pages fetched successfully, ascending
    pub pages_collected: Vec<u32>,

    /// Pages that contributed nothing because their fetch failed
    pub skipped: Vec<PageSkipped>,
}

impl CollectionReport {
    pub fn skipped_pages(&self) -> Vec<u32> {
        self.skipped.iter().map(|s| s.page).collect()
    }
}

/// Collects the entries of a thread's pages
pub struct Collector<'a> {
    source: &'a dyn PageSource,
    parser: &'a EntryParser,
    thread: &'a ThreadUrl,
    pacing: DelayWindow,
}

impl<'a> Collector<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        parser: &'a EntryParser,
        thread: &'a ThreadUrl,
        pacing: DelayWindow,
    ) -> Self {
        Self {
            source,
            parser,
            thread,
            pacing,
        }
    }

    /// Fetches pages `1..=last_page` in order and accumulates their entries
    ///
    /// A paced delay separates consecutive fetches whatever their outcome.
    pub async fn collect(&self, last_page: u32) -> CollectionReport {
        let mut report = CollectionReport::default();

        for page in 1..=last_page {
            let started = Instant::now();
            let page_url = self.thread.page_url(page);

            match self.source.fetch_page(&page_url).await {
                Ok(html) => {
                    let items = self.parser.extract(&html);
                    let added = items.len();
                    report.entries.extend(items);
                    report.pages_collected.push(page);
                    tracing::info!(
                        "[OK] p={} +{} entries (TOTAL={}) | {:.2}s",
                        page,
                        added,
                        report.entries.len(),
                        started.elapsed().as_secs_f64()
                    );
                }
                Err(source) => {
                    tracing::error!("GET failed for {} (last: {})", page_url, source);
                    report.skipped.push(PageSkipped { page, source });
                }
            }

            if page < last_page {
                self.pacing.pause().await;
            }
        }

        report
    }
}
