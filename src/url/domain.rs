use crate::url::CanonicalUrl;
use url::Url;

/// Extracts the crawl domain from a URL
///
/// The host is lowercased and a leading `www.` label is removed, so that the
/// result compares equal to [`CanonicalUrl::host`] for every page of the same site.
/// Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sweep::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(strip_www(&host).to_string())
}

/// Removes every leading `www.` label, keeping at least one label
pub(crate) fn strip_www(host: &str) -> &str {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        host = rest;
    }
    host
}

/// Returns true if the canonical URL lives on the seed domain
///
/// Subdomains are different sites: `blog.example.com` is not on `example.com`.
pub fn is_same_domain(url: &CanonicalUrl, seed_domain: &str) -> bool {
    url.host().eq_ignore_ascii_case(seed_domain)
}
