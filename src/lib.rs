//! Reddot-Folio: a paginated design-award collector
//!
//! This crate crawls a paginated search API category by category, deduplicates
//! records across each crawl session, enriches every record with its detail
//! page and image, persists each page incrementally, and merges the rendered
//! pages into one document with continuous page numbering.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Reddot-Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Unexpected content type '{content_type}' for {url}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Render error: {0}")]
    Render(#[from] output::RenderError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Setup error: {0}")]
    Setup(String),
}

impl FolioError {
    /// Returns true for failures worth another attempt: network errors,
    /// timeouts, and non-2xx responses.
    ///
    /// Parse failures and content mismatches are permanent; retrying would
    /// receive the same payload again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }
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

/// Result type alias for Reddot-Folio operations
pub type Result<T> = std::result::Result<T, FolioError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{EnrichedRecord, PageBatch, SearchRecord};
pub use state::CrawlPhase;
