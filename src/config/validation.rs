use crate::config::types::{
    ApiConfig, CategoryConfig, Config, CrawlConfig, OutputConfig, RetryConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_retry_config(&config.retry)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("site-base-url", &config.site_base_url)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root_dir.is_empty() {
        return Err(ConfigError::Validation(
            "root-dir cannot be empty".to_string(),
        ));
    }

    if config.artifact_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "artifact-prefix cannot be empty".to_string(),
        ));
    }

    if config.page_width < 20 {
        return Err(ConfigError::Validation(format!(
            "page-width must be >= 20, got {}",
            config.page_width
        )));
    }

    Ok(())
}

/// Category names become directory and file names, so they are restricted
/// to a portable character set.
fn validate_categories(categories: &[CategoryConfig]) -> Result<(), ConfigError> {
    if categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[category]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for category in categories {
        if category.name.is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        if !category
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "category name must contain only ASCII letters, digits, '_' or '-', got '{}'",
                category.name
            )));
        }

        if !names.insert(category.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name '{}'",
                category.name
            )));
        }

        if category.filters.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty filter value",
                category.name
            )));
        }
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
