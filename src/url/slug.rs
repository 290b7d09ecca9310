use url::Url;

/// Slug used when a URL has no usable path segment
pub const DEFAULT_SLUG: &str = "thread";

/// Derives a file-name-safe slug from the last path segment of a URL
///
/// Characters that are not portable in file names are replaced by `_`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use thread_harvest::url::slug_from_url;
///
/// let url = Url::parse("https://forum.example.com/some-topic--8000065?a=popular").unwrap();
/// assert_eq!(slug_from_url(&url), "some-topic--8000065");
///
/// let url = Url::parse("https://forum.example.com/").unwrap();
/// assert_eq!(slug_from_url(&url), "thread");
/// ```
pub fn slug_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("");

    let slug: String = segment
        .chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if slug.trim_matches(|c| c == '.' || c == '_').is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}
