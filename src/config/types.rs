use crate::output::ExportFormat;
use serde::Deserialize;

/// Relay endpoints tried after the direct route, in order
pub const DEFAULT_RELAY_ROUTES: &[&str] = &[
    "https://api.allorigins.win/raw?url={url}",
    "https://corsproxy.io/?{url}",
];

/// Main configuration structure for Sumi-Sweep
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Run configuration validated by the engine at `start`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Maximum number of pages a run may visit
    pub max_pages: usize,

    /// Minimum pause between consecutive fetches (milliseconds)
    pub delay_ms: u64,

    /// Route pages that look script-rendered through the render transport
    pub use_rendering_transport: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            delay_ms: 1000,
            use_rendering_transport: false,
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// User-Agent header sent on every request
    pub user_agent: String,

    /// Per-request timeout for the plain transport (seconds)
    pub timeout_secs: u64,

    /// Hard timeout for the render transport (milliseconds)
    pub render_timeout_ms: u64,

    /// Render service endpoint, a URL template containing `{url}`
    pub render_endpoint: Option<String>,

    /// Ordered fetch routes: `"direct"` or a relay URL template containing `{url}`
    pub routes: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let mut routes = vec!["direct".to_string()];
        routes.extend(DEFAULT_RELAY_ROUTES.iter().map(|r| r.to_string()));

        Self {
            user_agent: format!("sumi-sweep/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            render_timeout_ms: 10_000,
            render_endpoint: None,
            routes,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the exported result file
    pub path: String,

    /// Export format; inferred from the path extension when absent
    pub format: Option<ExportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "sweep-results.csv".to_string(),
            format: None,
        }
    }
}
