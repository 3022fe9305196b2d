//! Fetch strategy and transports
//!
//! This module resolves one URL to page content, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - An ordered list of fetch routes (direct or through relay endpoints)
//! - A render-capable transport guarded by a hard timeout
//! - Classifying pages that only make sense once their scripts have run

use crate::config::{Config, FetchConfig};
use crate::url::{canonicalize, CanonicalUrl};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed by the plain transport
const MAX_REDIRECTS: usize = 10;

/// Markup tokens that identify client-side rendered front ends
const FRAMEWORK_SIGNATURES: &[&str] = &[
    "react",
    "vue",
    "angular",
    "__next_data__",
    "__nuxt__",
    "ng-app",
    "data-reactroot",
];

/// Errors that can occur while fetching a single page
///
/// None of these abort a crawl; the page is classified as failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("all {attempts} fetch routes failed for {url}")]
    AllRoutesExhausted { url: String, attempts: usize },

    #[error("timed out after {after:?} rendering {url}")]
    Timeout { url: String, after: Duration },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid fetch route: {0}")]
    InvalidRoute(String),
}

/// Raw result of a transport
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Page markup
    pub body: String,

    /// URL the content was served from (may differ from the request after redirects)
    pub final_url: Url,
}

/// A mechanism able to turn a URL into page content
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// One way of reaching a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRoute {
    /// Request the URL itself
    Direct,

    /// Request a relay endpoint; `{url}` in the template is replaced by the
    /// percent-encoded target URL
    Relay { template: String },
}

impl FetchRoute {
    /// Placeholder substituted with the target URL in relay templates
    pub const URL_PLACEHOLDER: &'static str = "{url}";

    /// Parses a route from its configuration form
    ///
    /// `"direct"` (any case) selects the direct route; anything else must be an
    /// http(s) URL template containing `{url}`.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();

        if raw.eq_ignore_ascii_case("direct") {
            return Ok(Self::Direct);
        }

        if !raw.contains(Self::URL_PLACEHOLDER) {
            return Err(FetchError::InvalidRoute(format!(
                "relay template '{}' must contain {}",
                raw,
                Self::URL_PLACEHOLDER
            )));
        }

        let probe = Url::parse(&raw.replace(Self::URL_PLACEHOLDER, "placeholder"))
            .map_err(|e| FetchError::InvalidRoute(format!("'{}': {}", raw, e)))?;

        if probe.scheme() != "http" && probe.scheme() != "https" {
            return Err(FetchError::InvalidRoute(format!(
                "relay template '{}' must use http or https",
                raw
            )));
        }

        Ok(Self::Relay {
            template: raw.to_string(),
        })
    }

    /// Builds the URL actually requested for `target` on this route
    pub fn request_url(&self, target: &Url) -> Result<Url, FetchError> {
        match self {
            Self::Direct => Ok(target.clone()),
            Self::Relay { template } => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();
                let relayed = template.replace(Self::URL_PLACEHOLDER, &encoded);
                Url::parse(&relayed)
                    .map_err(|e| FetchError::InvalidRoute(format!("'{}': {}", relayed, e)))
            }
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Direct => "direct",
            Self::Relay { template } => template,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use sumi_sweep::config::FetchConfig;
/// use sumi_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain transport: tries each route in order, first HTTP success wins
pub struct HttpTransport {
    client: Client,
    routes: Vec<FetchRoute>,
}

impl HttpTransport {
    /// Creates a transport over the given routes
    pub fn new(client: Client, routes: Vec<FetchRoute>) -> Self {
        Self { client, routes }
    }

    /// Creates a transport from configuration route strings
    pub fn from_config(client: Client, config: &FetchConfig) -> Result<Self, FetchError> {
        let routes = config
            .routes
            .iter()
            .map(|r| FetchRoute::parse(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(client, routes))
    }

    /// Returns the configured routes
    pub fn routes(&self) -> &[FetchRoute] {
        &self.routes
    }

    async fn fetch_via(&self, route: &FetchRoute, target: &Url) -> Result<FetchedPage, FetchError> {
        let request_url = route.request_url(target)?;
        let response = self.client.get(request_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: request_url.to_string(),
                status: status.as_u16(),
            });
        }

        // Relays hide the redirect chain, so only the direct route reports a final URL
        let final_url = match route {
            FetchRoute::Direct => response.url().clone(),
            FetchRoute::Relay { .. } => target.clone(),
        };

        let body = response.text().await?;
        Ok(FetchedPage { body, final_url })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        for route in &self.routes {
            match self.fetch_via(route, url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    tracing::debug!("Route {} failed for {}: {}", route.label(), url, e);
                }
            }
        }

        Err(FetchError::AllRoutesExhausted {
            url: url.to_string(),
            attempts: self.routes.len(),
        })
    }
}

/// Render-capable transport guarded by a hard timeout
///
/// Any transport able to return script-rendered markup can sit behind this
/// wrapper. Redirect chains are not tracked: the final URL is always the request URL.
pub struct RenderTransport {
    renderer: Arc<dyn Transport>,
    timeout: Duration,
}

impl RenderTransport {
    pub fn new(renderer: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { renderer, timeout }
    }
}

#[async_trait]
impl Transport for RenderTransport {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        match tokio::time::timeout(self.timeout, self.renderer.fetch(url)).await {
            Ok(result) => result.map(|page| FetchedPage {
                body: page.body,
                final_url: url.clone(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }),
        }
    }
}

/// Content of a successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Page markup
    pub content: String,

    /// Canonical URL the content was served from
    pub final_url: CanonicalUrl,

    /// Whether the render transport produced the content
    pub rendered: bool,
}

/// Chooses between the plain and the render transport for each page
pub struct FetchStrategy {
    plain: Arc<dyn Transport>,
    renderer: Option<RenderTransport>,
}

impl FetchStrategy {
    /// Creates a strategy that only uses the plain transport
    pub fn new(plain: Arc<dyn Transport>) -> Self {
        Self {
            plain,
            renderer: None,
        }
    }

    /// Adds a render-capable transport with its hard timeout
    pub fn with_renderer(mut self, renderer: Arc<dyn Transport>, timeout: Duration) -> Self {
        self.renderer = Some(RenderTransport::new(renderer, timeout));
        self
    }

    /// Builds the strategy described by the configuration
    ///
    /// The render transport is only installed when the run asks for it and a
    /// render endpoint is configured.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = build_http_client(&config.fetch)?;
        let plain = HttpTransport::from_config(client.clone(), &config.fetch)?;
        let strategy = Self::new(Arc::new(plain));

        match (
            config.crawl.use_rendering_transport,
            &config.fetch.render_endpoint,
        ) {
            (true, Some(endpoint)) => {
                let renderer = HttpTransport::new(client, vec![FetchRoute::parse(endpoint)?]);
                Ok(strategy.with_renderer(
                    Arc::new(renderer),
                    Duration::from_millis(config.fetch.render_timeout_ms),
                ))
            }
            _ => Ok(strategy),
        }
    }

    /// Returns true if a render transport is installed
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Classifies a page as needing script rendering
    ///
    /// Network failures while classifying mean "does not need rendering".
    pub async fn needs_rendering(&self, url: &Url) -> bool {
        matches!(self.classify(url).await, Classification::ScriptRendered)
    }

    /// Fetches `url` through the plain transport and inspects the markup
    async fn classify(&self, url: &Url) -> Classification {
        match self.plain.fetch(url).await {
            Ok(page) if looks_script_rendered(&page.body) => Classification::ScriptRendered,
            Ok(page) => Classification::Static(page),
            Err(e) => {
                tracing::debug!("Render classification failed for {}: {}", url, e);
                Classification::Unreachable
            }
        }
    }

    /// Fetches one page
    ///
    /// # Flow
    ///
    /// 1. Without a render transport, use the plain transport
    /// 2. Otherwise fetch through the plain transport to classify the page
    ///    - static markup is returned as is
    ///    - script-rendered markup is fetched again through the render transport
    ///    - a classification failure falls back to the plain transport
    pub async fn fetch(&self, url: &CanonicalUrl) -> Result<FetchOutcome, FetchError> {
        let target = url.as_url();

        let Some(renderer) = &self.renderer else {
            return self.fetch_plain(url).await;
        };

        match self.classify(target).await {
            Classification::Static(page) => Ok(finish(url, page, false)),
            Classification::ScriptRendered => {
                tracing::debug!("{} looks script-rendered, using render transport", url);
                let page = renderer.fetch(target).await?;
                Ok(finish(url, page, true))
            }
            Classification::Unreachable => self.fetch_plain(url).await,
        }
    }

    async fn fetch_plain(&self, url: &CanonicalUrl) -> Result<FetchOutcome, FetchError> {
        let page = self.plain.fetch(url.as_url()).await?;
        Ok(finish(url, page, false))
    }
}

/// Result of inspecting a page through the plain transport
enum Classification {
    /// Static markup, kept so it is not fetched twice
    Static(FetchedPage),
    ScriptRendered,
    Unreachable,
}

/// Canonicalizes the served URL, keeping the requested one if it is refused
fn finish(requested: &CanonicalUrl, page: FetchedPage, rendered: bool) -> FetchOutcome {
    let final_url =
        canonicalize(page.final_url.as_str(), None).unwrap_or_else(|_| requested.clone());

    FetchOutcome {
        content: page.body,
        final_url,
        rendered,
    }
}

/// Heuristic: a script tag plus a known front-end framework signature
pub fn looks_script_rendered(html: &str) -> bool {
    let lower = html.to_lowercase();
    lower.contains("<script")
        && FRAMEWORK_SIGNATURES
            .iter()
            .any(|signature| lower.contains(signature))
}
