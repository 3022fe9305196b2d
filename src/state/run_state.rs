/// Run state definitions for the crawl engine
///
/// This module defines the lifecycle of a single crawl run.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run has been started yet
    #[default]
    Idle,

    // ===== Active States =====
    /// The engine is fetching pages
    Running,

    /// The engine holds the frontier but admits no new work
    Paused,

    // ===== Terminal States =====
    /// The frontier was exhausted or the page budget was reached
    Completed,

    /// The run was stopped explicitly or by an unrecoverable loop error
    Stopped,
}

impl RunState {
    /// Returns true if this is a terminal state for the current run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }

    /// Returns true while the crawl loop is alive (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Checks whether the engine may move from this state to `next`
    ///
    /// `Running` is reachable from every non-active state because `start`
    /// resets the engine before entering it.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (Self::Idle | Self::Completed | Self::Stopped, Self::Running) => true,
            (Self::Running, Self::Paused) | (Self::Paused, Self::Running) => true,
            (Self::Running | Self::Paused, Self::Completed | Self::Stopped) => true,
            _ => false,
        }
    }

    /// Returns the lowercase name used in logs and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
