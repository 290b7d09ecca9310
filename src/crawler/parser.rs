//! HTML parser for thread pages
//!
//! This module handles the two things read from a page:
//! - Entries: the text of the configured content blocks, cleaned
//! - Link evidence: the highest page number linked from the page for the
//!   same thread

use crate::url::ThreadUrl;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINE_ENDING_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Extracts entry text from thread pages
///
/// The selectors are joined into one selector group, so entries come out in
/// document order whichever selector matched them.
#[derive(Debug, Clone)]
pub struct EntryParser {
    selector: Selector,
}

impl EntryParser {
    /// Builds a parser from a list of CSS selectors
    ///
    /// # Example
    ///
    /// ```
    /// use thread_harvest::crawler::EntryParser;
    ///
    /// let parser = EntryParser::new(&["#entry-item-list .content"]).unwrap();
    /// let html = r#"<ul id="entry-item-list"><li><div class="content">hello</div></li></ul>"#;
    /// assert_eq!(parser.extract(html), vec!["hello".to_string()]);
    /// ```
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self, ConfigError> {
        let group = selectors
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let selector =
            Selector::parse(&group).map_err(|_| ConfigError::InvalidSelector(group.clone()))?;

        Ok(Self { selector })
    }

    /// Returns the cleaned text of every matching block, in document order
    ///
    /// Blocks that are empty after cleaning are dropped, so an empty result
    /// means the page carries no entries.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.selector)
            .filter_map(|element| clean_entry_text(&element_text(element)))
            .collect()
    }
}

/// Joins the element's text nodes, each trimmed, with newlines
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cleans a raw entry text
///
/// Decodes entities left over in the text, normalizes line endings and
/// collapses runs of blank lines to a single one. Returns `None` for text
/// that is empty after cleaning.
pub fn clean_entry_text(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let text = decoded.trim();
    if text.is_empty() {
        return None;
    }

    let text = LINE_ENDING_REGEX.replace_all(text, "\n");
    let text = MULTI_NEWLINE_REGEX.replace_all(&text, "\n\n");
    let text = text.trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Returns the highest page number linked from `html` for the same thread
///
/// Every `<a href>` is resolved against the thread's base URL; links whose
/// path differs from the thread path, or that carry no valid page number,
/// are ignored. Returns 1 when nothing qualifies.
pub fn max_page_from_links(html: &str, thread: &ThreadUrl) -> u32 {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return 1;
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, thread.base()))
        .filter_map(|link| thread.page_of(&link))
        .fold(1, u32::max)
}

/// Resolves a link href against the base URL
///
/// Returns None for empty hrefs, fragment-only anchors, non-HTTP schemes and
/// anything that fails to parse.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}
