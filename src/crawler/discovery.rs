//! Last-page discovery
//!
//! The number of pages of a thread is not known up front. It is estimated in
//! two stages:
//!
//! 1. Link evidence: the highest page number linked from page 1 and, when
//!    page 1 alone is inconclusive, page 2. Evidence that reaches the
//!    threshold is trusted as is.
//! 2. Sequential walk: otherwise pages after the estimate are probed one by
//!    one until a page has no entries or cannot be fetched, bounded by a
//!    hard cap.

use crate::config::{DelayWindow, DiscoveryConfig};
use crate::crawler::fetcher::PageSource;
use crate::crawler::parser::{max_page_from_links, EntryParser};
use crate::url::ThreadUrl;
use crate::FetchError;
use thiserror::Error;

/// Lowest page the sequential walk starts after
const WALK_START_FLOOR: u32 = 2;

/// Discovery could not even read the first page
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch first page {url}: {source}")]
    FirstPage {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Why the sequential walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    /// The page exists but carries no entries
    EmptyPage(u32),
    /// The page could not be fetched
    FetchFailed(u32),
    /// The probe cap was reached without a stopping signal
    CapReached,
}

/// What discovery saw on its way to the last page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Final answer, always >= 1
    pub last_page: u32,

    /// Highest page number seen in links of the inspected pages
    pub max_observed_page: u32,

    /// Pages whose links were scanned (a subset of 1 and 2)
    pub pages_inspected_for_links: Vec<u32>,

    /// Pages fetched by the sequential walk that had entries
    pub walked_pages: Vec<u32>,

    /// Why the walk ended; `None` when link evidence was trusted
    pub walk_stop: Option<WalkStop>,
}

impl DiscoveryReport {
    fn from_links(max_observed_page: u32, pages_inspected_for_links: Vec<u32>) -> Self {
        Self {
            last_page: max_observed_page,
            max_observed_page,
            pages_inspected_for_links,
            walked_pages: Vec::new(),
            walk_stop: None,
        }
    }
}

/// Estimates the last page of a thread
pub struct LastPageEstimator<'a> {
    source: &'a dyn PageSource,
    parser: &'a EntryParser,
    thread: &'a ThreadUrl,
    policy: DiscoveryConfig,
    walk_pacing: DelayWindow,
}

impl<'a> LastPageEstimator<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        parser: &'a EntryParser,
        thread: &'a ThreadUrl,
        policy: &DiscoveryConfig,
        walk_pacing: DelayWindow,
    ) -> Self {
        Self {
            source,
            parser,
            thread,
            policy: policy.clone(),
            walk_pacing,
        }
    }

    /// Returns the last page of the thread
    ///
    /// Fails only when page 1 cannot be fetched; callers are expected to
    /// substitute a fallback in that case.
    pub async fn discover(&self) -> Result<u32, DiscoveryError> {
        Ok(self.discover_with_report().await?.last_page)
    }

    /// Same as [`discover`](Self::discover), with the evidence behind the answer
    pub async fn discover_with_report(&self) -> Result<DiscoveryReport, DiscoveryError> {
        let threshold = self.policy.link_evidence_threshold;

        let first_url = self.thread.page_url(1);
        let m1 = self
            .scan_links(1)
            .await
            .map_err(|source| DiscoveryError::FirstPage {
                url: first_url.to_string(),
                source,
            })?;
        let mut inspected = vec![1];

        let mut m2 = m1;
        if m1 < threshold {
            match self.scan_links(2).await {
                Ok(found) => {
                    m2 = m1.max(found);
                    inspected.push(2);
                }
                Err(e) => tracing::debug!("Link scan of page 2 skipped: {}", e),
            }
        }

        let candidate = m1.max(m2);
        tracing::info!("Last page (from links): {}", candidate);

        let mut report = DiscoveryReport::from_links(candidate, inspected);
        if candidate >= threshold {
            return Ok(report);
        }

        self.walk(&mut report).await;
        Ok(report)
    }

    /// Fetches a page and returns the highest page number it links to
    async fn scan_links(&self, page: u32) -> Result<u32, FetchError> {
        let html = self.source.fetch_page(&self.thread.page_url(page)).await?;
        let found = max_page_from_links(&html, self.thread);
        tracing::debug!("Page {} links up to page {}", page, found);
        Ok(found)
    }

    /// Probes pages after the link estimate until a stopping signal
    async fn walk(&self, report: &mut DiscoveryReport) {
        let current = report.max_observed_page.max(WALK_START_FLOOR);
        let mut candidate = report.max_observed_page;

        for page in (current + 1)..=current.saturating_add(self.policy.max_seq_walk) {
            match self.source.fetch_page(&self.thread.page_url(page)).await {
                Ok(html) => {
                    if self.parser.extract(&html).is_empty() {
                        tracing::info!("Walk stop: p={} empty (last full={})", page, page - 1);
                        report.walk_stop = Some(WalkStop::EmptyPage(page));
                        report.last_page = page - 1;
                        return;
                    }

                    candidate = page;
                    report.walked_pages.push(page);
                    tracing::info!("Walk: p={} has entries -> candidate={}", page, candidate);
                    self.walk_pacing.pause().await;
                }
                Err(e) => {
                    tracing::info!("Walk stop: p={} error ({}) -> last={}", page, e, candidate);
                    report.walk_stop = Some(WalkStop::FetchFailed(page));
                    report.last_page = candidate;
                    return;
                }
            }
        }

        tracing::warn!(
            "Walk cap of {} pages reached, stopping at p={}",
            self.policy.max_seq_walk,
            candidate
        );
        report.walk_stop = Some(WalkStop::CapReached);
        report.last_page = candidate;
    }
}
