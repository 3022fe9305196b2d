use crate::config::types::{Config, CrawlConfig, FetchConfig, OutputConfig};
use crate::crawler::FetchRoute;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;

    if config.crawl.use_rendering_transport && config.fetch.render_endpoint.is_none() {
        return Err(ConfigError::Validation(
            "use-rendering-transport requires fetch.render-endpoint".to_string(),
        ));
    }

    Ok(())
}

/// Validates the run configuration
///
/// The engine calls this again at `start`, since runs can be configured
/// programmatically without going through a config file.
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    // delay_ms >= 0 is always true for u64, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be a positive integer, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.render_timeout_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "render-timeout-ms must be >= 1, got {}",
            config.render_timeout_ms
        )));
    }

    if config.routes.is_empty() {
        return Err(ConfigError::Validation(
            "at least one fetch route is required".to_string(),
        ));
    }

    for route in &config.routes {
        FetchRoute::parse(route).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
    }

    if let Some(endpoint) = &config.render_endpoint {
        match FetchRoute::parse(endpoint) {
            Ok(FetchRoute::Relay { .. }) => {}
            Ok(FetchRoute::Direct) => {
                return Err(ConfigError::InvalidUrl(
                    "render-endpoint must be a URL template, not \"direct\"".to_string(),
                ))
            }
            Err(e) => return Err(ConfigError::InvalidUrl(e.to_string())),
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
