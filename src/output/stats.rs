//! Run counters and their console summary

use crate::output::CrawlResults;
use serde::Serialize;
use std::fmt;

/// Counters of a crawl run
///
/// All counters are monotonically non-decreasing during a run and reset when
/// a new run starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Every link candidate offered to the frontier
    pub discovered: u64,

    /// Pages fetched and parsed
    pub succeeded: u64,

    /// Pages whose fetch failed
    pub failed: u64,

    /// Candidates already known, plus redirects onto another canonical URL
    pub duplicate: u64,

    /// Candidates outside the seed domain
    pub external: u64,
}

impl CrawlStats {
    /// Pages that reached a final classification
    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Percentage of processed pages that succeeded
    pub fn success_rate(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / processed as f64) * 100.0
    }
}

/// End-of-run summary shown on the console
pub struct StatisticsReport<'a>(pub &'a CrawlResults);

impl fmt::Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let results = self.0;
        let stats = &results.stats;

        writeln!(f, "=== Crawl Statistics ===\n")?;
        writeln!(f, "Run state: {}", results.state)?;
        if let Some(started) = results.started_at {
            writeln!(f, "Started at: {}", started.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(f)?;

        writeln!(f, "Overview:")?;
        writeln!(f, "  Pages visited: {}", results.total_pages)?;
        writeln!(f, "  Links discovered: {}", stats.discovered)?;
        writeln!(f, "  External links: {}", stats.external)?;
        writeln!(f, "  Duplicates: {}", stats.duplicate)?;
        writeln!(f, "  Failed pages: {}", stats.failed)?;
        writeln!(f)?;

        if !results.failed_urls.is_empty() {
            writeln!(f, "Failed URLs ({}):", results.failed_urls.len())?;
            for url in &results.failed_urls {
                writeln!(f, "  - {}", url)?;
            }
            writeln!(f)?;
        }

        if let Some(error) = &results.error {
            writeln!(f, "Run aborted: {}", error)?;
            writeln!(f)?;
        }

        write!(
            f,
            "Success Rate: {:.1}% ({} / {} pages successfully processed)",
            stats.success_rate(),
            stats.succeeded,
            stats.processed()
        )
    }
}

/// Renders the end-of-run summary as a string
pub fn format_statistics(results: &CrawlResults) -> String {
    StatisticsReport(results).to_string()
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(results: &CrawlResults) {
    println!("{}", StatisticsReport(results));
}
