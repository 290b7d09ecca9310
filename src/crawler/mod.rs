//! Crawler module for thread page fetching and processing
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with identity fallback and retry
//! - Entry extraction and pager link inspection
//! - Last-page discovery
//! - Sequential page collection
//! - Overall run orchestration

mod collector;
mod discovery;
mod fetcher;
mod harvester;
mod parser;

#[cfg(test)]
mod testing;

pub use collector::{CollectionReport, Collector, PageSkipped};
pub use discovery::{DiscoveryError, DiscoveryReport, LastPageEstimator, WalkStop};
pub use fetcher::{build_http_client, BackoffPolicy, Identity, PageFetcher, PageSource};
pub use harvester::{Harvester, LastPage};
pub use parser::{clean_entry_text, max_page_from_links, EntryParser};

use crate::config::Config;
use crate::output::RunSummary;

/// Harvests the thread named by `config` over the network
///
/// This is the main entry point for a run. It will:
/// 1. Build the desktop and mobile HTTP clients
/// 2. Discover the last page
/// 3. Collect every page's entries
/// 4. Write the result file and log a summary
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished (possibly degraded, see the summary)
/// * `Err(HarvestError)` - Setup failed before any request was sent
pub async fn harvest(config: Config) -> crate::Result<RunSummary> {
    let harvester = Harvester::new(config)?;
    Ok(harvester.run().await)
}
