//! Observer trait and the data it receives
//!
//! This module defines the interface through which a running crawl reports
//! progress and log events, and the snapshot returned when a run ends.

use crate::output::CrawlStats;
use crate::state::RunState;
use crate::url::CanonicalUrl;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Category of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    /// A page fetch is starting
    Crawl,
    /// A new same-domain URL was queued
    Discover,
    Redirect,
    Error,
    Success,
    Warning,
}

/// Human-readable event emitted during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    pub message: String,
    pub level: LogLevel,
}

/// Progress report emitted after every processed page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Visited pages relative to the page budget, capped at 100
    pub progress_percent: f64,

    pub visited: usize,
    pub queued: usize,
    pub failed: usize,

    /// Wall-clock time since the run started, e.g. `"2m 5s"`
    pub elapsed_formatted: String,

    /// `"warming up"`, `"finishing"` or a formatted duration
    pub eta_formatted: String,

    pub average_sec_per_page: f64,

    /// Visited plus failed
    pub pages_processed: usize,
}

/// Receives events from a running crawl
///
/// Callbacks run on the crawl task and must return quickly. Both methods
/// default to doing nothing, so implementors only override what they need.
pub trait CrawlObserver: Send + Sync {
    /// Called after each processed page
    fn on_progress(&self, _event: &ProgressEvent) {}

    /// Called for each log event
    fn on_log(&self, _event: &LogEvent) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

/// Snapshot of a run, available at any time and returned when it ends
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResults {
    /// Visited URLs in lexicographic order
    pub urls: Vec<CanonicalUrl>,

    pub stats: CrawlStats,

    /// Failed URLs in lexicographic order
    pub failed_urls: Vec<CanonicalUrl>,

    /// Number of visited URLs
    pub total_pages: usize,

    pub state: RunState,

    pub started_at: Option<DateTime<Utc>>,

    /// Message of the fault that aborted the run, if any
    pub error: Option<String>,
}
