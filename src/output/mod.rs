//! Output module for rendering and packaging crawl results
//!
//! This module handles:
//! - The rendering collaborator boundary (`SectionRenderer`) and its Markdown
//!   implementation
//! - Merging cover and sections into one continuously numbered document
//! - Per-category statistics and the end-of-run summary

mod markdown;
mod merger;
pub mod stats;
mod traits;

pub use markdown::{format_record_page, MarkdownRenderer, IMAGE_PLACEHOLDER, NO_DESCRIPTION};
pub use merger::{
    artifact_file_name, stamp_footer, write_artifact, DocumentMerger, MergedDocument,
    OutlineEntry, StampedPage, PAGE_SEPARATOR,
};
pub use stats::{print_statistics, write_statistics, CrawlStatistics, SessionOutcome};
pub use traits::{
    CoverDescriptor, Page, RenderError, RenderResult, Section, SectionMarker, SectionRenderer,
};
