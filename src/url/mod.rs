//! URL handling module for Sumi-Sweep
//!
//! This module provides URL canonicalization and domain scoping. Every identity
//! comparison in the crawler goes through [`CanonicalUrl`].

mod canonicalize;
mod domain;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::RejectionReason;

// Re-export main functions
pub use canonicalize::canonicalize;
pub use domain::{extract_domain, is_same_domain};

/// A normalized absolute URL, the unique identity of a page during a crawl
///
/// Values can only be produced by [`canonicalize`], so holding one guarantees the
/// canonical form: lowercase scheme and host, no leading `www.`, no fragment, no
/// repeated or trailing slashes, and no tracking query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub(crate) fn from_normalized(url: Url) -> Self {
        Self(url)
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host (already lowercased, without `www.`)
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for CanonicalUrl {
    type Err = RejectionReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        canonicalize(s, None)
    }
}
