//! Configuration module for Reddot-Folio
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reddot_folio::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("folio.toml")).unwrap();
//! println!("Enrichment workers: {}", config.crawl.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, CategoryConfig, Config, CrawlConfig, OutputConfig, RetryConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
