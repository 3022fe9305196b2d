//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Fetching through ordered routes, with an optional render transport
//! - HTML link extraction
//! - The frontier of queued, visited and failed URLs
//! - Per-page timing and completion estimates
//! - Overall crawl coordination with pause, resume and stop

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod timing;

#[cfg(test)]
mod testing;

pub use coordinator::Crawler;
pub use fetcher::{
    build_http_client, looks_script_rendered, FetchError, FetchOutcome, FetchRoute, FetchStrategy,
    FetchedPage, HttpTransport, RenderTransport, Transport,
};
pub use frontier::{Admission, Frontier};
pub use parser::extract_links;
pub use timing::{format_duration, pages_remaining, Eta, TimeTracker, MAX_SAMPLES, WARMUP_SAMPLES};
