//! Crawler module for the search-and-enrich pipeline
//!
//! This module contains the core crawling logic, including:
//! - Search page fetching with a fixed-delay retry policy
//! - Session-scoped deduplication
//! - Detail page parsing and image downloads
//! - Bounded-concurrency enrichment
//! - Per-category orchestration and the multi-category coordinator

mod asset;
mod coordinator;
mod dedup;
mod detail;
mod fetcher;
mod orchestrator;
mod parser;
mod pool;
mod retry;

pub use asset::AssetDownloader;
pub use coordinator::{run_crawl, Coordinator};
pub use dedup::{DedupResult, Deduplicator, SeenIdSet};
pub use detail::DetailEnricher;
pub use fetcher::{
    build_http_client, get_checked, get_text, parse_search_page, PageFetcher, PageResult,
    ParsedSearchPage,
};
pub use orchestrator::{CategoryRun, CrawlOrchestrator, CrawlServices};
pub use parser::parse_detail_html;
pub use pool::{fan_out, EnrichmentPool, EnrichmentReport, FanOut};
pub use retry::RetryPolicy;
