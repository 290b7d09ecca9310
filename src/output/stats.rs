//! Run summary reporting
//!
//! A summary is produced at the end of every harvest, whatever went wrong
//! along the way.

use std::path::PathBuf;
use std::time::Duration;

/// What a single harvest did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Wall-clock time of the whole run
    pub elapsed: Duration,

    /// Last page of the collected range `1..=last_page`
    pub last_page: u32,

    /// Whether the last page is the fallback rather than a discovered value
    pub discovery_fell_back: bool,

    /// Number of pages fetched successfully during collection
    pub pages_collected: usize,

    /// Pages skipped because their fetch failed, ascending
    pub pages_skipped: Vec<u32>,

    /// Total entries collected
    pub entries: usize,

    /// The result file, if one was written
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    /// Logs the one-line summary plus any degraded outcome
    pub fn log(&self) {
        if !self.pages_skipped.is_empty() {
            tracing::warn!(
                "{} page(s) skipped: {:?}",
                self.pages_skipped.len(),
                self.pages_skipped
            );
        }

        tracing::info!(
            "Done in {:.2}s (pages=1..{}, entries={})",
            self.elapsed.as_secs_f64(),
            self.last_page,
            self.entries
        );
    }

    /// Prints the summary to stdout
    pub fn print(&self) {
        println!("=== Harvest Summary ===\n");

        println!("  Elapsed: {:.2}s", self.elapsed.as_secs_f64());
        print!("  Pages: 1..{}", self.last_page);
        if self.discovery_fell_back {
            print!(" (fallback, discovery failed)");
        }
        println!();
        println!(
            "  Pages collected: {} ({:.1}%)",
            self.pages_collected,
            self.success_rate()
        );

        if !self.pages_skipped.is_empty() {
            let skipped: Vec<String> = self.pages_skipped.iter().map(|p| p.to_string()).collect();
            println!(
                "  Pages skipped ({}): {}",
                self.pages_skipped.len(),
                skipped.join(", ")
            );
        }

        println!("  Entries: {}", self.entries);

        match &self.output_path {
            Some(path) => println!("\n✓ Saved to: {}", path.display()),
            None => println!("\n✗ No file written"),
        }
    }

    /// Share of the attempted pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        if self.last_page == 0 {
            return 0.0;
        }
        (self.pages_collected as f64 / self.last_page as f64) * 100.0
    }
}
