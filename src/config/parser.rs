use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use reddot_folio::config::load_config;
///
/// let config = load_config(Path::new("folio.toml")).unwrap();
/// println!("Categories: {}", config.categories.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[api]
base-url = "https://www.red-dot.org/de/search/search.json"
site-base-url = "https://www.red-dot.org"
user-agent = "TestFolio/1.0"

[retry]
max-attempts = 4
delay-ms = 250
timeout-secs = 5

[crawl]
max-workers = 6
keyword = "chair"
max-pages = 12
stop-on-repeated-page = false

[output]
root-dir = "./out"
artifact-prefix = "designs"
document-title = "Collection"
attribution = "folio"
page-width = 72

[[category]]
name = "product_design"
filters = ["meta_categories:/10/"]

[[category]]
name = "design_concept"
filters = ["meta_categories:/12/", "year:2024"]
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(FULL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.api.user_agent, "TestFolio/1.0");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.crawl.max_workers, 6);
        assert_eq!(config.crawl.keyword.as_deref(), Some("chair"));
        assert_eq!(config.crawl.max_pages, 12);
        assert!(!config.crawl.stop_on_repeated_page);
        assert_eq!(config.output.page_width, 72);
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[1].filters.len(), 2);
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[api]
base-url = "https://example.com/search.json"
site-base-url = "https://example.com"

[[category]]
name = "all"
"#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.retry.timeout_secs, 10);
        assert_eq!(config.crawl.max_workers, 8);
        assert!(config.crawl.stop_on_repeated_page);
        assert_eq!(config.output.root_dir, "output");
        assert!(config.categories[0].filters.is_empty());
        assert!(config.api.user_agent.starts_with("reddot-folio/"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/folio.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config(
            r#"
[api]
base-url = "https://example.com/search.json"
site-base-url = "https://example.com"

[retry]
max-attempts = 0

[[category]]
name = "all"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_hash_is_stable() {
        let file1 = create_temp_config(FULL_CONFIG);
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let (_, hash1_again) = load_config_with_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_eq!(hash1, hash1_again);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash2);
    }
}
