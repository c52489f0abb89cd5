use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Reddot-Folio
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryConfig>,
}

/// Search API endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// The search endpoint returning JSON pages
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Prefix joined with each record's detail-URL suffix
    #[serde(rename = "site-base-url")]
    pub site_base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Retry budget shared by page, detail and asset fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between failed attempts (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-attempt timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Page loop and enrichment behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of records enriched concurrently
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Optional free-text search term
    #[serde(default)]
    pub keyword: Option<String>,

    /// Stop a category after this many pages (0 = unbounded)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,

    /// End a category when a non-empty page contains only already-seen records
    #[serde(rename = "stop-on-repeated-page", default = "default_true")]
    pub stop_on_repeated_page: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            keyword: None,
            max_pages: 0,
            stop_on_repeated_page: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one sub-directory per category
    #[serde(rename = "root-dir", default = "default_root_dir")]
    pub root_dir: String,

    /// File name prefix of the merged document
    #[serde(rename = "artifact-prefix", default = "default_artifact_prefix")]
    pub artifact_prefix: String,

    /// Title printed on the cover page
    #[serde(rename = "document-title", default = "default_document_title")]
    pub document_title: String,

    /// Attribution stamped in every content page footer
    #[serde(default = "default_attribution")]
    pub attribution: String,

    /// Column width used to right-align page numbers
    #[serde(rename = "page-width", default = "default_page_width")]
    pub page_width: usize,
}

impl OutputConfig {
    /// Returns the per-category output root
    pub fn category_root(&self, category: &str) -> PathBuf {
        PathBuf::from(&self.root_dir).join(category)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            artifact_prefix: default_artifact_prefix(),
            document_title: default_document_title(),
            attribution: default_attribution(),
            page_width: default_page_width(),
        }
    }
}

/// One independently crawled category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Name used for the output directory and artifact file name
    pub name: String,

    /// Filter values sent as repeated `solr[filter][]` parameters
    #[serde(default)]
    pub filters: Vec<String>,
}

fn default_user_agent() -> String {
    format!("reddot-folio/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_workers() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_root_dir() -> String {
    "output".to_string()
}

fn default_artifact_prefix() -> String {
    "reddot_designs".to_string()
}

fn default_document_title() -> String {
    "Red Dot Design Award Collection".to_string()
}

fn default_attribution() -> String {
    "Red Dot Design Award Collection - reddot-folio".to_string()
}

fn default_page_width() -> usize {
    80
}
