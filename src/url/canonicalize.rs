use crate::url::domain::strip_www;
use crate::url::CanonicalUrl;
use crate::RejectionReason;
use url::Url;

/// Query parameter name prefixes that only carry tracking information
const TRACKING_PARAM_PREFIXES: &[&str] = &[
    "utm_", "fbclid", "gclid", "msclkid", "trk_", "ref", "source",
];

/// File extensions that never lead to crawlable pages
const EXCLUDED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip"];

/// Path fragments that mark account or machine endpoints
const EXCLUDED_PATHS: &[&str] = &["/admin", "/login", "/logout", "/register", "/api/"];

/// Canonicalizes a URL according to Sumi-Sweep's identity rules
///
/// # Canonicalization Steps
///
/// 1. Parse the URL, resolving it against `base` when one is given; reject if malformed
/// 2. Reject any scheme other than `http` and `https`
/// 3. Lowercase the host and remove a leading `www.` label
/// 4. Normalize path:
///    - Collapse repeated slashes
///    - Remove dot segments (. and ..)
///    - Remove trailing slash (except for root /)
/// 5. Reject excluded file extensions and excluded paths
/// 6. Remove fragment (everything after #)
/// 7. Remove tracking query parameters, keeping the others in their original order
/// 8. Remove empty query string (trailing ?)
///
/// The function is pure and idempotent: canonicalizing a canonical URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use sumi_sweep::url::canonicalize;
///
/// let url = canonicalize("HTTPS://WWW.Example.com//docs/?utm_source=x&id=1#top", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs?id=1");
/// ```
pub fn canonicalize(raw: &str, base: Option<&Url>) -> Result<CanonicalUrl, RejectionReason> {
    let raw = raw.trim();

    // Step 1: Parse the URL
    let parsed = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    let mut url = parsed.map_err(|e| RejectionReason::InvalidUrl(format!("{}: {}", raw, e)))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(RejectionReason::UnsupportedScheme(url.scheme().to_string()));
    }

    // Step 3: Lowercase the host and remove every leading www. label
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(RejectionReason::InvalidUrl(format!("{}: missing host", raw))),
    };
    url.set_host(Some(strip_www(&host)))
        .map_err(|e| RejectionReason::InvalidUrl(format!("{}: {}", raw, e)))?;

    // Step 4: Normalize path
    let original_path = url.path().to_lowercase();
    let normalized_path = normalize_path(url.path());

    // Step 5: Exclusions are checked on both spellings of the path
    for path in [original_path.as_str(), normalized_path.to_lowercase().as_str()] {
        check_exclusions(path)?;
    }
    url.set_path(&normalized_path);

    // Step 6: Remove fragment
    url.set_fragment(None);

    // Steps 7 & 8: Filter query parameters
    if url.query().is_some() {
        let kept = filter_query_params(&url);

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept.iter());
        }
    }

    Ok(CanonicalUrl::from_normalized(url))
}

/// Rejects paths carrying an excluded extension or an excluded path fragment
fn check_exclusions(lower_path: &str) -> Result<(), RejectionReason> {
    if let Some(ext) = EXCLUDED_EXTENSIONS
        .iter()
        .find(|ext| lower_path.ends_with(*ext))
    {
        return Err(RejectionReason::ExcludedExtension(ext.to_string()));
    }

    if let Some(fragment) = EXCLUDED_PATHS
        .iter()
        .find(|fragment| lower_path.contains(*fragment))
    {
        return Err(RejectionReason::ExcludedPath(fragment.to_string()));
    }

    Ok(())
}

/// Normalizes a URL path by removing dot segments, empty segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Drops tracking parameters and keeps the remaining pairs in their original order
fn filter_query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    TRACKING_PARAM_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}
