//! HTML link extraction
//!
//! This module pulls every URL-carrying attribute out of a document:
//! - `<a href>` and `<link href>`
//! - `<img src>`, `<script src>`
//! - `<frame src>` and `<iframe src>`
//!
//! Filtering (scheme, extension, path, domain) is not done here; every candidate
//! goes through the canonicalizer in the frontier so that it is counted as discovered.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Elements and the attribute that carries their URL
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("frame", "src"),
    ("iframe", "src"),
];

/// Selector group matching every element listed in `LINK_SOURCES`
fn link_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR
        .get_or_init(|| {
            let group = LINK_SOURCES
                .iter()
                .map(|(tag, attr)| format!("{}[{}]", tag, attr))
                .collect::<Vec<_>>()
                .join(", ");
            Selector::parse(&group).ok()
        })
        .as_ref()
}

/// Extracts all candidate links from an HTML document
///
/// Each attribute value is resolved against `page_url`. Values that cannot be
/// resolved are dropped silently, so extraction never fails as a whole.
///
/// # Returns
///
/// Absolute URL strings, deduplicated, in document order
///
/// # Example
///
/// ```
/// use sumi_sweep::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="logo.png"><a href="/about">Again</a>"#;
/// let page = Url::parse("https://example.com/").unwrap();
/// assert_eq!(
///     extract_links(html, &page),
///     vec!["https://example.com/about", "https://example.com/logo.png"]
/// );
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<String> {
    let Some(selector) = link_selector() else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(selector) {
        let attr = match element.value().name() {
            "a" | "link" => "href",
            _ => "src",
        };

        let Some(value) = element.value().attr(attr) else {
            continue;
        };

        match resolve_link(value, page_url) {
            Some(absolute) => {
                if seen.insert(absolute.clone()) {
                    links.push(absolute);
                }
            }
            None => tracing::trace!("Dropping unresolvable link {:?} on {}", value, page_url),
        }
    }

    links
}

/// Resolves an attribute value to an absolute URL
///
/// Returns None for empty values and values that do not parse.
fn resolve_link(value: &str, page_url: &Url) -> Option<String> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    page_url.join(value).ok().map(String::from)
}
