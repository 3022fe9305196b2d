//! Per-page timing and completion estimates

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Number of most recent samples kept for the running average
pub const MAX_SAMPLES: usize = 50;

/// Samples required before an estimate is produced
pub const WARMUP_SAMPLES: usize = 5;

/// Estimated time to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// Too few samples to estimate
    WarmingUp,

    /// Nothing left to fetch
    Finishing,

    Remaining(Duration),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::WarmingUp => f.write_str("warming up"),
            Eta::Finishing => f.write_str("finishing"),
            Eta::Remaining(duration) => f.write_str(&format_duration(*duration)),
        }
    }
}

/// Sliding window of per-page processing times
///
/// The sum of the window is kept alongside it so that each sample costs O(1).
#[derive(Debug)]
pub struct TimeTracker {
    samples: VecDeque<u64>,
    total_ms: u64,
    started: Instant,
}

impl Default for TimeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeTracker {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            total_ms: 0,
            started: Instant::now(),
        }
    }

    /// Drops all samples and restarts the elapsed clock
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records the processing time of one page, evicting the oldest sample when full
    pub fn record(&mut self, sample_ms: u64) {
        if self.samples.len() == MAX_SAMPLES {
            if let Some(oldest) = self.samples.pop_front() {
                self.total_ms -= oldest;
            }
        }

        self.samples.push_back(sample_ms);
        self.total_ms += sample_ms;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Mean of the current window in milliseconds, 0 when empty
    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.total_ms as f64 / self.samples.len() as f64
    }

    /// Estimates the time needed for `pages_remaining` more pages
    pub fn estimate(&self, pages_remaining: usize) -> Eta {
        if self.samples.len() < WARMUP_SAMPLES {
            return Eta::WarmingUp;
        }

        if pages_remaining == 0 {
            return Eta::Finishing;
        }

        let millis = pages_remaining as f64 * self.average_ms();
        Eta::Remaining(Duration::from_secs_f64(millis / 1000.0))
    }

    /// Wall-clock time since the tracker was created or reset
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Pages still expected to be fetched in this run
///
/// Bounded by both the queue and the unused part of the budget.
pub fn pages_remaining(queued: usize, budget: usize, processed: usize) -> usize {
    queued.min(budget.saturating_sub(processed))
}

/// Formats a duration as `"1h 2m 3s"`, `"2m 5s"` or `"7s"`
///
/// Sub-second parts are rounded to the nearest second.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sumi_sweep::crawler::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(3723)), "1h 2m 3s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
/// assert_eq!(format_duration(Duration::from_millis(400)), "0s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = (duration.as_millis() + 500) / 1000;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
