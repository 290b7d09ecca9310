//! Harvest orchestration
//!
//! Ties discovery, collection and the result file together for one thread:
//!
//! 1. Prepare the output directory
//! 2. Discover the last page (falling back to a fixed page on failure)
//! 3. Collect pages `1..=last_page`
//! 4. Write the entries and report a summary

use crate::config::Config;
use crate::crawler::collector::Collector;
use crate::crawler::discovery::{DiscoveryReport, LastPageEstimator};
use crate::crawler::fetcher::{PageFetcher, PageSource};
use crate::crawler::parser::EntryParser;
use crate::output::{output_file_name, prepare_output_dir, write_entries, RunSummary};
use crate::url::ThreadUrl;
use crate::{ConfigError, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of last-page discovery after the fallback policy was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPage {
    pub page: u32,

    /// Evidence behind `page`; `None` when discovery failed and the
    /// configured fallback was used
    pub report: Option<DiscoveryReport>,
}

impl LastPage {
    pub fn fell_back(&self) -> bool {
        self.report.is_none()
    }
}

/// Harvests one thread through a [`PageSource`]
pub struct Harvester<S = PageFetcher> {
    config: Config,
    thread: ThreadUrl,
    parser: EntryParser,
    source: S,
}

impl Harvester<PageFetcher> {
    /// Creates a harvester that talks to the network
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Bad URL, selector or HTTP client setup
    pub fn new(config: Config) -> Result<Self> {
        let source = PageFetcher::new(&config.fetch)?;
        Self::with_source(config, source)
    }
}

impl<S: PageSource> Harvester<S> {
    /// Creates a harvester over any page source
    pub fn with_source(config: Config, source: S) -> Result<Self> {
        let raw = config
            .source
            .url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("a thread URL is required".to_string()))?;
        let thread = ThreadUrl::parse(raw, &config.source.page_param)?;
        let parser = EntryParser::new(&config.parser.entry_selectors)?;

        Ok(Self {
            config,
            thread,
            parser,
            source,
        })
    }

    pub fn thread(&self) -> &ThreadUrl {
        &self.thread
    }

    /// Discovers the last page, substituting the configured fallback when
    /// page 1 cannot be read
    pub async fn discover_last_page(&self) -> LastPage {
        let estimator = LastPageEstimator::new(
            &self.source,
            &self.parser,
            &self.thread,
            &self.config.discovery,
            self.config.pacing.walk_step,
        );

        match estimator.discover_with_report().await {
            Ok(report) => {
                tracing::info!("Last page: {}", report.last_page);
                LastPage {
                    page: report.last_page,
                    report: Some(report),
                }
            }
            Err(e) => {
                let fallback = self.config.discovery.fallback_last_page;
                tracing::error!(
                    "Last page could not be discovered: {} -> using {}",
                    e,
                    fallback
                );
                LastPage {
                    page: fallback,
                    report: None,
                }
            }
        }
    }

    /// Applies the optional `max-pages` cap to a discovered last page
    pub fn collection_range(&self, last_page: u32) -> u32 {
        match self.config.output.max_pages {
            Some(max) if max < last_page => {
                tracing::warn!(
                    "Collecting pages 1..{} of {} (max-pages = {})",
                    max,
                    last_page,
                    max
                );
                max
            }
            _ => last_page,
        }
    }

    /// Runs a complete harvest
    ///
    /// Never fails: fetch, discovery and write problems are logged and
    /// reflected in the returned summary.
    pub async fn run(&self) -> RunSummary {
        let started = Instant::now();
        tracing::info!("Start: {}", self.thread);

        let output_dir = prepare_output_dir(Path::new(&self.config.output.output_dir));

        let discovered = self.discover_last_page().await;
        let last_page = self.collection_range(discovered.page);

        let collector = Collector::new(
            &self.source,
            &self.parser,
            &self.thread,
            self.config.pacing.between_pages,
        );
        let collected = collector.collect(last_page).await;

        let output_path = self.persist(&output_dir, last_page, &collected.entries);

        let summary = RunSummary {
            elapsed: started.elapsed(),
            last_page,
            discovery_fell_back: discovered.fell_back(),
            pages_collected: collected.pages_collected.len(),
            pages_skipped: collected.skipped_pages(),
            entries: collected.entries.len(),
            output_path,
        };
        summary.log();
        summary
    }

    /// Writes entries to a fresh timestamped file; nothing is written for an
    /// empty harvest
    fn persist(&self, output_dir: &Path, last_page: u32, entries: &[String]) -> Option<PathBuf> {
        if entries.is_empty() {
            tracing::warn!("No entries collected, nothing written");
            return None;
        }

        let file_name = output_file_name(&self.thread.slug(), last_page, &Local::now());
        let path = output_dir.join(file_name);

        match write_entries(&path, entries, &self.config.output.bullet) {
            Ok(()) => {
                tracing::info!("Saved -> {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }
}
