use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Thread-Harvest
///
/// Every section is optional in the TOML file; missing values take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub pacing: PacingConfig,
    pub discovery: DiscoveryConfig,
    pub parser: ParserConfig,
    pub output: OutputConfig,
}

/// The thread to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Thread URL, with or without an existing page parameter
    pub url: Option<String>,

    /// Query parameter that carries the page number
    pub page_param: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            page_param: "p".to_string(),
        }
    }
}

/// Per-request behaviour of the page fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Transport timeout applied to every request (seconds)
    pub timeout_secs: u64,

    /// Attempts made with each client identity before moving on
    pub retries_per_identity: u32,

    /// Backoff before the second attempt (milliseconds), doubled per attempt
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff sleep (milliseconds)
    pub backoff_cap_ms: u64,

    /// Random jitter added to each backoff
    pub jitter: DelayWindow,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 25,
            retries_per_identity: 2,
            backoff_base_ms: 800,
            backoff_cap_ms: 2500,
            jitter: DelayWindow::new(50, 250),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Self-throttling delays between requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// Delay between consecutive page fetches during collection
    pub between_pages: DelayWindow,

    /// Delay after each successful probe of the sequential walk
    pub walk_step: DelayWindow,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_pages: DelayWindow::new(80, 200),
            walk_step: DelayWindow::new(50, 120),
        }
    }
}

/// Last-page discovery policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Hard cap on pages probed by the sequential walk
    pub max_seq_walk: u32,

    /// Link evidence at or above this page number is trusted without walking
    pub link_evidence_threshold: u32,

    /// Last page assumed when discovery fails outright
    pub fallback_last_page: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_seq_walk: 1000,
            link_evidence_threshold: 3,
            fallback_last_page: 2,
        }
    }
}

/// Entry extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserConfig {
    /// CSS selectors of the content blocks holding entries, in priority order
    pub entry_selectors: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            entry_selectors: vec![
                "#pinned-entry .content".to_string(),
                "#entry-item-list .content".to_string(),
            ],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving the result file
    pub output_dir: String,

    /// Marker written before every entry
    pub bullet: String,

    /// Optional cap on the number of pages collected
    pub max_pages: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            bullet: "• ".to_string(),
            max_pages: None,
        }
    }
}

/// Inclusive window of milliseconds a random delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A window that never sleeps
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Draws a uniformly distributed delay from the window
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    /// Sleeps for a sampled delay, returning immediately for a zero window
    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.source.page_param, "p");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(25));
        assert_eq!(config.fetch.retries_per_identity, 2);
        assert_eq!(config.pacing.between_pages, DelayWindow::new(80, 200));
        assert_eq!(config.discovery.max_seq_walk, 1000);
        assert_eq!(config.discovery.link_evidence_threshold, 3);
        assert_eq!(config.discovery.fallback_last_page, 2);
        assert_eq!(config.output.bullet, "• ");
        assert!(config.output.max_pages.is_none());
    }

    #[test]
    fn test_delay_window_sample_within_bounds() {
        let window = DelayWindow::new(80, 200);
        for _ in 0..100 {
            let d = window.sample().as_millis() as u64;
            assert!((80..=200).contains(&d), "sampled {}ms", d);
        }
    }

    #[test]
    fn test_zero_window_is_zero() {
        assert!(DelayWindow::zero().sample().is_zero());
    }
}
