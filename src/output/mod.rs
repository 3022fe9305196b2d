//! Output module for crawl events, results and exports
//!
//! This module handles:
//! - The observer interface for progress and log events
//! - The results snapshot and its counters
//! - Console statistics and file export (CSV, JSON, text)

mod export;
pub mod stats;
mod traits;

pub use export::{export_results, write_results, ExportError, ExportFormat};
pub use stats::{format_statistics, print_statistics, CrawlStats, StatisticsReport};
pub use traits::{CrawlObserver, CrawlResults, LogEvent, LogLevel, NoopObserver, ProgressEvent};
