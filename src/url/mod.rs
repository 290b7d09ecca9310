//! URL handling module for Thread-Harvest
//!
//! This module turns the configured source URL into a [`ThreadUrl`]: the
//! thread's base address without its page parameter, from which every page
//! URL is built and against which pagination links are recognised.

mod normalize;
mod slug;

use crate::UrlResult;
use url::Url;

// Re-export main functions
pub use normalize::{build_page_url, normalize_base, page_number};
pub use slug::{slug_from_url, DEFAULT_SLUG};

/// A thread's base address together with the name of its page parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadUrl {
    base: Url,
    page_param: String,
}

impl ThreadUrl {
    /// Parses and normalizes a source URL
    ///
    /// # Examples
    ///
    /// ```
    /// use thread_harvest::url::ThreadUrl;
    ///
    /// let thread = ThreadUrl::parse("https://forum.example.com/topic--1?a=popular&p=5", "p").unwrap();
    /// assert_eq!(thread.base().as_str(), "https://forum.example.com/topic--1?a=popular");
    /// assert_eq!(
    ///     thread.page_url(2).as_str(),
    ///     "https://forum.example.com/topic--1?a=popular&p=2"
    /// );
    /// ```
    pub fn parse(url_str: &str, page_param: &str) -> UrlResult<Self> {
        Ok(Self {
            base: normalize_base(url_str, page_param)?,
            page_param: page_param.to_string(),
        })
    }

    /// The base URL, without any page parameter
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    /// Path component shared by every page of the thread
    pub fn path(&self) -> &str {
        self.base.path()
    }

    /// URL of page `page` (1-based)
    pub fn page_url(&self, page: u32) -> Url {
        build_page_url(&self.base, &self.page_param, page)
    }

    /// Page number a link points at, if the link belongs to this thread
    ///
    /// A link belongs to the thread when its path equals the base path
    /// exactly; host and other query parameters are not compared.
    pub fn page_of(&self, link: &Url) -> Option<u32> {
        if link.path() != self.path() {
            return None;
        }
        page_number(link, &self.page_param)
    }

    /// File-name slug derived from the last path segment
    pub fn slug(&self) -> String {
        slug_from_url(&self.base)
    }
}

impl std::fmt::Display for ThreadUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)
    }
}
