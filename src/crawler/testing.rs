//! In-memory thread used by the unit tests

use crate::crawler::fetcher::PageSource;
use crate::url::{page_number, ThreadUrl};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use url::Url;

/// A thread whose pages are served from memory
///
/// Pages that were never added answer 404, pages marked failing answer 503.
/// Every request is recorded.
pub struct FakeThread {
    page_param: String,
    pages: HashMap<u32, String>,
    failing: HashSet<u32>,
    fetched: Mutex<Vec<u32>>,
}

impl FakeThread {
    pub fn new(thread: &ThreadUrl) -> Self {
        Self {
            page_param: thread.page_param().to_string(),
            pages: HashMap::new(),
            failing: HashSet::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn page(mut self, page: u32, html: String) -> Self {
        self.pages.insert(page, html);
        self
    }

    /// Adds a generated page, see [`thread_page`]
    pub fn entries(self, page: u32, count: usize, links: &[u32]) -> Self {
        self.page(page, thread_page(page, count, links))
    }

    pub fn failing(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    /// Page numbers requested so far, in request order
    pub fn fetched_pages(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakeThread {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let page = page_number(url, &self.page_param).unwrap_or(0);
        self.fetched.lock().unwrap().push(page);

        if self.failing.contains(&page) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }

        self.pages.get(&page).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Markup of page `page` holding `count` entries and pager links to `links`
///
/// Entry texts read `p<page> entry <n>`.
pub fn thread_page(page: u32, count: usize, links: &[u32]) -> String {
    let items: String = (1..=count)
        .map(|n| {
            format!(
                r#"<li><div class="content">p{} entry {}</div></li>"#,
                page, n
            )
        })
        .collect();
    let pager: String = links
        .iter()
        .map(|p| format!(r#"<a href="?p={}">{}</a>"#, p, p))
        .collect();

    format!(
        r#"<html><body><div class="pager">{}</div><ul id="entry-item-list">{}</ul></body></html>"#,
        pager, items
    )
}
