//! HTTP fetcher implementation
//!
//! This module handles the search API side of the crawl:
//! - Building the shared HTTP client
//! - Issuing GET requests and classifying failures for the retry policy
//! - Building paginated search requests
//! - Parsing and validating search result entries

use crate::config::ApiConfig;
use crate::crawler::retry::RetryPolicy;
use crate::record::SearchRecord;
use crate::FolioError;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Result of fetching one search page
#[derive(Debug)]
pub enum PageResult {
    /// Valid records of the page, in API order
    ///
    /// `records` is empty when every one of the `raw_count` entries failed
    /// validation.
    Records {
        records: Vec<SearchRecord>,
        raw_count: usize,
    },

    /// The API returned no entries; the category is exhausted
    EndOfResults,

    /// Retries exhausted or the body was unusable; ends the current category
    FatalError(String),
}

/// Builds the HTTP client shared by every fetcher in a run
///
/// # Arguments
///
/// * `config` - API configuration providing the user agent
/// * `timeout` - Request timeout, matching the retry policy's attempt timeout
pub fn build_http_client(config: &ApiConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request and fails on any non-2xx status
///
/// Connection failures map to [`FolioError::Http`], client-side timeouts to
/// [`FolioError::Timeout`], and error statuses to [`FolioError::Status`];
/// all three are transient for the retry policy.
pub async fn get_checked(client: &Client, url: &str) -> Result<Response, FolioError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FolioError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Fetches a URL and returns its body as text
pub async fn get_text(client: &Client, url: &str) -> Result<String, FolioError> {
    get_checked(client, url)
        .await?
        .text()
        .await
        .map_err(|e| classify_request_error(url, e))
}

pub(crate) fn classify_request_error(url: &str, error: reqwest::Error) -> FolioError {
    if error.is_timeout() {
        FolioError::Timeout {
            url: url.to_string(),
        }
    } else {
        FolioError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Retrieves and parses pages of the search API
pub struct PageFetcher {
    client: Client,
    base_url: Url,
    site_base_url: String,
    retry: RetryPolicy,
}

impl PageFetcher {
    /// Creates a page fetcher
    ///
    /// # Returns
    ///
    /// * `Err(FolioError::UrlParse)` - `base_url` is not a valid URL
    pub fn new(
        client: Client,
        base_url: &str,
        site_base_url: &str,
        retry: RetryPolicy,
    ) -> Result<Self, FolioError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            site_base_url: site_base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Builds the request URL for one page
    ///
    /// Filters are sent as repeated `solr[filter][]` parameters, the page as
    /// `solr[page]`, and a non-blank keyword as `solr[q]`.
    pub fn page_url(&self, page_index: u32, filters: &[String], keyword: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair("solr[filter][]", filter);
            }
            pairs.append_pair("solr[page]", &page_index.to_string());
            if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
                pairs.append_pair("solr[q]", keyword);
            }
        }
        url
    }

    /// Fetches one page of search results
    ///
    /// # Arguments
    ///
    /// * `page_index` - 1-based page number
    /// * `filters` - Category filter values (zero or more)
    /// * `keyword` - Optional free-text search term
    ///
    /// # Returns
    ///
    /// A [`PageResult`]; this method never returns an error directly since
    /// every failure mode maps to `FatalError`.
    pub async fn fetch(&self, page_index: u32, filters: &[String], keyword: Option<&str>) -> PageResult {
        let url = self.page_url(page_index, filters, keyword);
        tracing::debug!("Requesting search page: {}", url);

        let client = &self.client;
        let url_str = url.as_str();
        let body = match self
            .retry
            .with_retry(url_str, move |_| get_text(client, url_str))
            .await
        {
            Ok(body) => body,
            Err(e) => {
                return PageResult::FatalError(format!("page {}: {}", page_index, e));
            }
        };

        match parse_search_page(&body, &self.site_base_url) {
            Ok(parsed) if parsed.raw_count == 0 => PageResult::EndOfResults,
            Ok(parsed) => {
                tracing::debug!(
                    "Page {}: {} entries, {} valid",
                    page_index,
                    parsed.raw_count,
                    parsed.records.len()
                );
                PageResult::Records {
                    records: parsed.records,
                    raw_count: parsed.raw_count,
                }
            }
            Err(e) => PageResult::FatalError(format!(
                "page {}: {}",
                page_index,
                FolioError::Parse {
                    url: url_str.to_string(),
                    message: e.to_string(),
                }
            )),
        }
    }
}

/// Entries of one parsed search page
#[derive(Debug, Clone)]
pub struct ParsedSearchPage {
    /// Number of entries in `result.docs` before validation
    pub raw_count: usize,

    /// Entries that passed validation, in API order
    pub records: Vec<SearchRecord>,
}

/// Parses a search API response body
///
/// A body without `result.docs` (or with a non-list value there) counts as a
/// page with zero entries. Entries missing a title, a large image URL, or a
/// detail-URL suffix are dropped with a warning.
///
/// # Returns
///
/// * `Ok(ParsedSearchPage)` - The body was valid JSON
/// * `Err(serde_json::Error)` - The body was not JSON
pub fn parse_search_page(body: &str, site_base_url: &str) -> Result<ParsedSearchPage, serde_json::Error> {
    let payload: Value = serde_json::from_str(body)?;

    let docs = match payload.pointer("/result/docs").and_then(Value::as_array) {
        Some(docs) => docs,
        None => {
            return Ok(ParsedSearchPage {
                raw_count: 0,
                records: Vec::new(),
            })
        }
    };

    let records = docs
        .iter()
        .filter_map(|doc| {
            let record = parse_entry(doc, site_base_url);
            if record.is_none() {
                tracing::warn!(
                    "Skipping entry missing title, image URL or detail URL: {}",
                    doc
                );
            }
            record
        })
        .collect();

    Ok(ParsedSearchPage {
        raw_count: docs.len(),
        records,
    })
}

fn parse_entry(doc: &Value, site_base_url: &str) -> Option<SearchRecord> {
    let title = text_at(doc, "/title");
    let image_url = text_at(doc, "/image/large");
    let suffix = text_at(doc, "/url");

    if title.is_empty() || image_url.is_empty() || suffix.is_empty() {
        return None;
    }

    let detail_url = if suffix.starts_with("http://") || suffix.starts_with("https://") {
        suffix.clone()
    } else if suffix.starts_with('/') {
        format!("{}{}", site_base_url, suffix)
    } else {
        format!("{}/{}", site_base_url, suffix)
    };

    Some(SearchRecord {
        id: Some(suffix),
        title,
        category: text_at(doc, "/data/category"),
        image_url,
        author: text_at(doc, "/meta_second"),
        year: text_at(doc, "/data/year"),
        detail_url,
    })
}

/// Reads a scalar at a JSON pointer as trimmed text; numbers are rendered,
/// anything else is empty
fn text_at(doc: &Value, pointer: &str) -> String {
    match doc.pointer(pointer) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
