use crate::config::types::{
    Config, DelayWindow, DiscoveryConfig, FetchConfig, OutputConfig, PacingConfig, ParserConfig,
    SourceConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on attempts per identity
pub const MAX_RETRIES_PER_IDENTITY: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_fetch_config(&config.fetch)?;
    validate_pacing_config(&config.pacing)?;
    validate_discovery_config(&config.discovery)?;
    validate_parser_config(&config.parser)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the thread source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let raw = config.url.as_deref().ok_or_else(|| {
        ConfigError::Validation("a thread URL is required (config [source] url or CLI)".into())
    })?;

    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid thread URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Thread URL '{}' must use http or https",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Thread URL '{}' has no host",
            raw
        )));
    }

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch behaviour
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if !(1..=MAX_RETRIES_PER_IDENTITY).contains(&config.retries_per_identity) {
        return Err(ConfigError::Validation(format!(
            "retries_per_identity must be between 1 and {}, got {}",
            MAX_RETRIES_PER_IDENTITY, config.retries_per_identity
        )));
    }

    if config.backoff_cap_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_cap_ms ({}) must be >= backoff_base_ms ({})",
            config.backoff_cap_ms, config.backoff_base_ms
        )));
    }

    validate_window("jitter", &config.jitter)
}

fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_window("between_pages", &config.between_pages)?;
    validate_window("walk_step", &config.walk_step)
}

fn validate_window(name: &str, window: &DelayWindow) -> Result<(), ConfigError> {
    if window.min_ms > window.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} window is inverted: min {}ms > max {}ms",
            name, window.min_ms, window.max_ms
        )));
    }
    Ok(())
}

/// Validates the discovery policy
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_seq_walk < 1 {
        return Err(ConfigError::Validation(format!(
            "max_seq_walk must be >= 1, got {}",
            config.max_seq_walk
        )));
    }

    if config.link_evidence_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "link_evidence_threshold must be >= 1, got {}",
            config.link_evidence_threshold
        )));
    }

    if config.fallback_last_page < 1 {
        return Err(ConfigError::Validation(format!(
            "fallback_last_page must be >= 1, got {}",
            config.fallback_last_page
        )));
    }

    Ok(())
}

/// Validates that every entry selector is usable CSS
fn validate_parser_config(config: &ParserConfig) -> Result<(), ConfigError> {
    if config.entry_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "at least one entry selector is required".to_string(),
        ));
    }

    for selector in &config.entry_selectors {
        if selector.trim().is_empty() || Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector(selector.clone()));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}
