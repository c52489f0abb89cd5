//! Rendering traits and types
//!
//! This module defines the boundary between the crawler and the rendering
//! collaborator: the section and cover types it produces, and the
//! `SectionRenderer` trait it implements.

use crate::record::EnrichedRecord;
use thiserror::Error;

/// Errors that can occur while rendering or writing output
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// One page of rendered text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: String,
}

impl Page {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Grouping metadata of a section
///
/// Carried alongside the content pages rather than rendered as a page of its
/// own, so it never takes part in page numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarker {
    /// 1-based API page index the section was built from
    pub page_index: u32,

    /// Number of records in the section
    pub record_count: usize,

    /// Local time the section was rendered
    pub generated_at: String,
}

/// Rendered content of one API page
#[derive(Debug, Clone)]
pub struct Section {
    pub page_index: u32,
    pub marker: SectionMarker,
    pub pages: Vec<Page>,
}

/// Inputs for the cover of a merged document
#[derive(Debug, Clone)]
pub struct CoverDescriptor {
    pub title: String,
    pub category: String,
    pub total_records: usize,
    pub generated_at: String,
    pub attribution: String,
}

/// Trait for rendering collaborators
///
/// Implementations turn enriched records into pages. They are shared across
/// category sessions and must be thread-safe.
pub trait SectionRenderer: Send + Sync {
    /// Renders the records of one API page into a section
    ///
    /// # Arguments
    ///
    /// * `page_index` - The 1-based API page the records came from
    /// * `records` - Enriched records in API order
    fn render_section(&self, page_index: u32, records: &[EnrichedRecord]) -> RenderResult<Section>;

    /// Renders the cover pages of a merged document
    ///
    /// # Arguments
    ///
    /// * `cover` - Title, counts and attribution for the cover
    fn render_cover(&self, cover: &CoverDescriptor) -> RenderResult<Vec<Page>>;
}
