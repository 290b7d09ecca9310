//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building one HTTP client per browser identity (desktop, mobile)
//! - GET requests for thread pages
//! - Retry logic with exponential backoff and jitter
//! - Error classification into [`FetchError`]

use crate::config::{DelayWindow, FetchConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Anything that can return the markup of a page
///
/// Implemented by [`PageFetcher`] for real HTTP traffic. Discovery and
/// collection only depend on this trait.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the non-empty body of the page at `url`
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

/// A browser profile presented to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Chrome on Windows
    Desktop,
    /// Chrome on Android
    Mobile,
}

impl Identity {
    /// Identities in the order they are tried
    pub const ALL: [Identity; 2] = [Identity::Desktop, Identity::Mobile];

    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Identity::Desktop => "web",
            Identity::Mobile => "mob",
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            Identity::Desktop => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            }
            Identity::Mobile => {
                "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36"
            }
        }
    }

    /// Browser navigation headers sent with every request of this identity
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("document"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("navigate"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("none"),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua"),
            HeaderValue::from_static(
                "\"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\", \"Not?A_Brand\";v=\"99\"",
            ),
        );

        let (mobile, platform) = match self {
            Identity::Desktop => ("?0", "\"Windows\""),
            Identity::Mobile => ("?1", "\"Android\""),
        };
        headers.insert(
            HeaderName::from_static("sec-ch-ua-mobile"),
            HeaderValue::from_static(mobile),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static(platform),
        );

        headers
    }
}

/// Exponential backoff between fetch attempts
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt, doubled for each further one
    pub base: Duration,
    /// Upper bound on any single delay, jitter included
    pub cap: Duration,
    /// Random jitter added before capping
    pub jitter: DelayWindow,
}

impl BackoffPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
            jitter: config.jitter,
        }
    }

    /// A policy that never sleeps
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            cap: Duration::ZERO,
            jitter: DelayWindow::zero(),
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let exponential = self.base.saturating_mul(factor);
        exponential.saturating_add(self.jitter.sample()).min(self.cap)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Builds the HTTP client for one identity
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use thread_harvest::crawler::{build_http_client, Identity};
///
/// let client = build_http_client(Identity::Mobile, Duration::from_secs(25)).unwrap();
/// ```
pub fn build_http_client(identity: Identity, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(identity.user_agent())
        .default_headers(identity.headers())
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches thread pages through both identities with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 with a body | Return the body |
/// | Any other status | Retry |
/// | HTTP 200, empty body | Retry |
/// | Transport error or timeout | Retry |
///
/// Each identity gets `retries_per_identity` attempts, desktop first. A
/// backoff sleep follows every failed attempt except the very last one.
pub struct PageFetcher {
    clients: Vec<(Identity, Client)>,
    retries_per_identity: u32,
    backoff: BackoffPolicy,
}

impl PageFetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let clients = Identity::ALL
            .iter()
            .map(|identity| {
                build_http_client(*identity, config.timeout()).map(|client| (*identity, client))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(FetchError::Client)?;

        Ok(Self {
            clients,
            retries_per_identity: config.retries_per_identity,
            backoff: BackoffPolicy::from_config(config),
        })
    }

    /// Replaces the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetches one page, returning its markup or the last failure seen
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let identities: Vec<Identity> =
            self.clients.iter().map(|(identity, _)| *identity).collect();
        let referer = referer_for(url);
        let referer = referer.as_ref();

        retry_across_identities(
            &identities,
            self.retries_per_identity,
            &self.backoff,
            url,
            |index| send(&self.clients[index].1, url, referer),
        )
        .await
    }
}

/// Runs `attempt` for each identity in turn, `retries_per_identity` times each
///
/// `attempt` receives the index of the identity in `identities`. A backoff
/// sleep follows every failure except the one on the last attempt of the
/// last identity.
async fn retry_across_identities<F, Fut>(
    identities: &[Identity],
    retries_per_identity: u32,
    backoff: &BackoffPolicy,
    url: &Url,
    mut attempt: F,
) -> Result<String, FetchError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<String, FetchError>>,
{
    let last_identity = identities.len().saturating_sub(1);
    let mut attempts_made: u32 = 0;
    let mut last_error = None;

    for (index, identity) in identities.iter().enumerate() {
        for try_number in 1..=retries_per_identity {
            attempts_made = attempts_made.saturating_add(1);

            match attempt(index).await {
                Ok(body) => {
                    if attempts_made > 1 {
                        tracing::debug!(
                            "GET {} succeeded ({}) after {} attempts",
                            url,
                            identity.label(),
                            attempts_made
                        );
                    }
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        "GET failed ({}) try {}/{} -> {}",
                        identity.label(),
                        try_number,
                        retries_per_identity,
                        e
                    );
                    last_error = Some(e);
                }
            }

            let final_attempt = index == last_identity && try_number == retries_per_identity;
            if !final_attempt {
                tokio::time::sleep(backoff.delay(try_number)).await;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::NoAttempts {
        url: url.to_string(),
    }))
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        self.fetch(url).await
    }
}

/// Sends a single GET and classifies the outcome
async fn send(
    client: &Client,
    url: &Url,
    referer: Option<&HeaderValue>,
) -> Result<String, FetchError> {
    let mut request = client.get(url.clone());
    if let Some(referer) = referer {
        request = request.header(REFERER, referer.clone());
    }

    let response = request.send().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    if body.is_empty() {
        return Err(FetchError::EmptyBody {
            url: url.to_string(),
        });
    }

    Ok(body)
}

/// Origin of the page, as a browser would send it when navigating a site
fn referer_for(url: &Url) -> Option<HeaderValue> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    HeaderValue::from_str(&format!("{}/", origin.ascii_serialization())).ok()
}
