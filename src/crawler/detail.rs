//! Detail page enrichment

use crate::crawler::fetcher::get_text;
use crate::crawler::parser::parse_detail_html;
use crate::crawler::retry::RetryPolicy;
use crate::record::DetailInfo;
use reqwest::Client;

/// Fetches and parses record detail pages
pub struct DetailEnricher {
    client: Client,
    retry: RetryPolicy,
}

impl DetailEnricher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Fetches a detail page
    ///
    /// # Returns
    ///
    /// * `Some(DetailInfo)` - The page was fetched and parsed
    /// * `None` - Every attempt failed; the caller keeps the record's
    ///   existing values
    pub async fn fetch(&self, detail_url: &str) -> Option<DetailInfo> {
        let client = &self.client;

        match self
            .retry
            .with_retry(detail_url, move |_| get_text(client, detail_url))
            .await
        {
            Ok(body) => {
                let detail = parse_detail_html(&body);
                tracing::debug!(
                    "Parsed detail page {} (description: {} chars, author: '{}')",
                    detail_url,
                    detail.description.len(),
                    detail.author
                );
                Some(detail)
            }
            Err(e) => {
                tracing::warn!("Detail page unavailable, keeping API values: {}", e);
                None
            }
        }
    }
}
