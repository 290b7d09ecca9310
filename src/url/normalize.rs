use crate::UrlError;
use url::form_urlencoded;
use url::Url;

/// Strips the page parameter from a thread URL, producing its base
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Drop every query pair whose key matches `page_param` (ASCII
///    case-insensitive); all other pairs are kept byte-for-byte, in order
/// 4. Remove the query string entirely if nothing is left
///
/// # Examples
///
/// ```
/// use thread_harvest::url::normalize_base;
///
/// let base = normalize_base("https://forum.example.com/t--1?a=popular&p=4", "p").unwrap();
/// assert_eq!(base.as_str(), "https://forum.example.com/t--1?a=popular");
/// ```
pub fn normalize_base(url_str: &str, page_param: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let kept = query_without_param(&url, page_param);
    url.set_query(if kept.is_empty() { None } else { Some(&kept) });

    Ok(url)
}

/// Builds the URL of one page of a thread
///
/// Any page parameter already present on `base` is replaced, so the result
/// always carries exactly one. Other parameters keep their original encoding
/// and order; the page parameter is appended last.
///
/// # Examples
///
/// ```
/// use thread_harvest::url::build_page_url;
/// use url::Url;
///
/// let base = Url::parse("https://forum.example.com/t--1?a=popular").unwrap();
/// let page = build_page_url(&base, "p", 3);
/// assert_eq!(page.as_str(), "https://forum.example.com/t--1?a=popular&p=3");
/// ```
pub fn build_page_url(base: &Url, page_param: &str, page: u32) -> Url {
    let mut url = base.clone();
    let mut query = query_without_param(base, page_param);

    if !query.is_empty() {
        query.push('&');
    }
    query.extend(form_urlencoded::byte_serialize(page_param.as_bytes()));
    query.push('=');
    query.push_str(&page.to_string());

    url.set_query(Some(&query));
    url
}

/// Reads the page number carried by a URL, if any
///
/// The key must match exactly; when repeated, the last occurrence wins.
/// Non-numeric or zero values are treated as absent.
pub fn page_number(url: &Url, page_param: &str) -> Option<u32> {
    url.query_pairs()
        .filter(|(key, _)| key == page_param)
        .last()
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
}

/// Returns the raw query of `url` minus every pair keyed by `page_param`
fn query_without_param(url: &Url, page_param: &str) -> String {
    let Some(query) = url.query() else {
        return String::new();
    };

    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            let key = form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(key, _)| key.into_owned())
                .unwrap_or_default();
            !key.eq_ignore_ascii_case(page_param)
        })
        .collect::<Vec<_>>()
        .join("&")
}
