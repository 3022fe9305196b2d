//! Crawl frontier
//!
//! This module tracks every URL of a run in exactly one of three places:
//! - the FIFO queue of URLs waiting to be fetched
//! - the visited set (successfully fetched, or currently in flight)
//! - the failed set
//!
//! It also owns the run counters, since every counter change is tied to a
//! frontier decision.

use crate::output::CrawlStats;
use crate::url::{canonicalize, is_same_domain, CanonicalUrl};
use crate::RejectionReason;
use std::collections::{HashSet, VecDeque};

/// What happened to a URL offered to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the queue
    Queued(CanonicalUrl),

    /// Refused by the canonicalizer
    Rejected(RejectionReason),

    /// Valid, but outside the seed domain
    External(CanonicalUrl),

    /// Already queued, visited or failed
    Duplicate(CanonicalUrl),
}

/// Frontier manages the queue and the visited/failed sets
///
/// A URL is queued at most once per run. Once visited or failed it is never
/// queued again, so every page is fetched at most once.
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, oldest first
    queue: VecDeque<CanonicalUrl>,

    /// Membership index for `queue`
    queued: HashSet<CanonicalUrl>,

    visited: HashSet<CanonicalUrl>,
    failed: HashSet<CanonicalUrl>,

    stats: CrawlStats,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, including counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Queues the seed of a run without touching the counters
    pub fn seed(&mut self, url: CanonicalUrl) {
        if !self.is_known(&url) {
            self.queued.insert(url.clone());
            self.queue.push_back(url);
        }
    }

    /// Offers a raw link found on a page
    ///
    /// Every offer counts as discovered. The link is then canonicalized,
    /// scoped to `seed_domain` and checked against the three sets, in that order.
    pub fn offer(&mut self, raw: &str, seed_domain: &str) -> Admission {
        self.stats.discovered += 1;

        let url = match canonicalize(raw, None) {
            Ok(url) => url,
            Err(reason) => {
                tracing::trace!("Rejected {}: {}", raw, reason);
                return Admission::Rejected(reason);
            }
        };

        if !is_same_domain(&url, seed_domain) {
            self.stats.external += 1;
            return Admission::External(url);
        }

        if self.is_known(&url) {
            self.stats.duplicate += 1;
            return Admission::Duplicate(url);
        }

        self.queued.insert(url.clone());
        self.queue.push_back(url.clone());
        Admission::Queued(url)
    }

    /// Pops the oldest queued URL
    pub fn take_next(&mut self) -> Option<CanonicalUrl> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Records a URL as visited
    ///
    /// Returns false (and changes nothing) if the URL was already visited or failed.
    pub fn mark_visited(&mut self, url: &CanonicalUrl) -> bool {
        if self.visited.contains(url) || self.failed.contains(url) {
            return false;
        }

        self.dequeue(url);
        self.visited.insert(url.clone());
        true
    }

    /// Records a URL as failed, moving it out of the visited set if needed
    ///
    /// Returns false if the URL had already failed; the failure counter only
    /// moves on the first transition.
    pub fn mark_failed(&mut self, url: &CanonicalUrl) -> bool {
        if self.failed.contains(url) {
            return false;
        }

        self.dequeue(url);
        self.visited.remove(url);
        self.failed.insert(url.clone());
        self.stats.failed += 1;
        true
    }

    /// Counts a page whose content was fetched and parsed
    pub fn record_success(&mut self) {
        self.stats.succeeded += 1;
    }

    /// Counts a redirect to a different canonical URL
    pub fn record_redirect(&mut self) {
        self.stats.duplicate += 1;
    }

    /// Returns true if the URL is queued, visited or failed
    pub fn is_known(&self, url: &CanonicalUrl) -> bool {
        self.queued.contains(url) || self.visited.contains(url) || self.failed.contains(url)
    }

    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    pub fn is_failed(&self, url: &CanonicalUrl) -> bool {
        self.failed.contains(url)
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn failed_len(&self) -> usize {
        self.failed.len()
    }

    /// Pages that reached a final classification (visited or failed)
    pub fn processed_len(&self) -> usize {
        self.visited.len() + self.failed.len()
    }

    /// Visited URLs in lexicographic order
    pub fn visited_urls(&self) -> Vec<CanonicalUrl> {
        sorted(&self.visited)
    }

    /// Failed URLs in lexicographic order
    pub fn failed_urls(&self) -> Vec<CanonicalUrl> {
        sorted(&self.failed)
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    fn dequeue(&mut self, url: &CanonicalUrl) {
        if self.queued.remove(url) {
            self.queue.retain(|queued| queued != url);
        }
    }
}

fn sorted(set: &HashSet<CanonicalUrl>) -> Vec<CanonicalUrl> {
    let mut urls: Vec<_> = set.iter().cloned().collect();
    urls.sort();
    urls
}
