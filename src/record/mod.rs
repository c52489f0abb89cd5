//! Record types flowing through the crawl pipeline
//!
//! - `SearchRecord`: one validated entry of a search API page
//! - `DetailInfo`: data scraped from a record's detail page
//! - `EnrichedRecord`: a search record merged with its detail data and image
//! - `PageBatch`: the enriched records of one API page, in API order

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Extra field holding the API page a record came from
pub const FIELD_SOURCE_PAGE: &str = "source_page";

/// Extra field holding the `{page}-{position}` sequence number
pub const FIELD_SEQUENCE: &str = "sequence";

/// A single entry parsed from a search results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRecord {
    /// Origin-provided identity used for deduplication
    pub id: Option<String>,

    pub title: String,

    pub category: String,

    /// URL of the large preview image
    pub image_url: String,

    /// Preliminary author from the search API, pending enrichment
    pub author: String,

    pub year: String,

    /// Absolute URL of the detail page
    pub detail_url: String,
}

/// Data extracted from a record's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    /// Text of the description block, empty when absent
    pub description: String,

    /// Comma-joined credit values, empty when absent
    pub author: String,
}

/// A search record after detail and image enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub author: String,
    pub year: String,
    pub detail_url: String,
    pub description: String,

    /// Content-addressed image file, `None` when the download failed
    pub local_image_path: Option<PathBuf>,

    /// Additional named fields persisted after the core columns
    pub extra: BTreeMap<String, String>,
}

impl EnrichedRecord {
    /// Creates an enriched record with default enrichment values
    pub fn from_search(record: SearchRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            category: record.category,
            image_url: record.image_url,
            author: record.author,
            year: record.year,
            detail_url: record.detail_url,
            description: String::new(),
            local_image_path: None,
            extra: BTreeMap::new(),
        }
    }

    /// Merges detail-page data into the record
    ///
    /// The description is always taken. The author is replaced only when the
    /// detail page yielded a non-empty value, so the API author survives a
    /// page without a credits block.
    pub fn apply_detail(&mut self, detail: DetailInfo) {
        self.description = detail.description;
        if !detail.author.is_empty() {
            self.author = detail.author;
        }
    }
}

/// Enriched records of one API page
#[derive(Debug, Clone)]
pub struct PageBatch {
    /// 1-based API page index
    pub page_index: u32,

    /// Records in API response order
    pub records: Vec<EnrichedRecord>,
}

impl PageBatch {
    /// Creates a batch, stamping each record's source page and sequence number
    pub fn new(page_index: u32, mut records: Vec<EnrichedRecord>) -> Self {
        for (position, record) in records.iter_mut().enumerate() {
            record
                .extra
                .insert(FIELD_SOURCE_PAGE.to_string(), page_index.to_string());
            record.extra.insert(
                FIELD_SEQUENCE.to_string(),
                format!("{}-{}", page_index, position + 1),
            );
        }

        Self {
            page_index,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
