//! Sumi-Sweep: a single-domain site sweeper
//!
//! This crate implements a web crawler that, starting from a seed URL, discovers and
//! fetches every same-domain page reachable by hyperlinks, up to a page budget.
//! Duplicate work is avoided through URL canonicalization and a three-set frontier.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL {seed}: {reason}")]
    InvalidSeed {
        seed: String,
        reason: RejectionReason,
    },

    #[error("A crawl is already in progress")]
    AlreadyRunning,

    #[error("Crawl task failed: {0}")]
    Task(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Why a raw URL was refused by the canonicalizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("excluded file extension: {0}")]
    ExcludedExtension(String),

    #[error("excluded path: {0}")]
    ExcludedPath(String),
}

/// Result type alias for Sumi-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, FetchStrategy};
pub use output::{CrawlResults, CrawlStats};
pub use state::RunState;
pub use crate::url::{canonicalize, CanonicalUrl};
