//! Document merging and page numbering
//!
//! The merger concatenates a cover and the sections of a category session:
//! - Cover pages come first and are never stamped
//! - Sections follow in API page order
//! - Every content page gets the attribution footer and a global page number
//!   continuing from the cover's page count
//! - Section markers go to the outline, never into the page sequence

use crate::output::traits::{Page, RenderResult, Section, SectionMarker};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Separator line between pages in a written artifact
pub const PAGE_SEPARATOR: &str = "\u{000C}";

/// A page of the merged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedPage {
    pub body: String,

    /// Global page number, `None` for cover pages
    pub number: Option<usize>,

    /// Footer line, `None` for cover pages
    pub footer: Option<String>,
}

impl StampedPage {
    fn cover(page: Page) -> Self {
        Self {
            body: page.body,
            number: None,
            footer: None,
        }
    }

    /// Page text including its footer
    pub fn render(&self) -> String {
        let mut text = self.body.trim_end().to_string();
        text.push('\n');
        if let Some(footer) = &self.footer {
            text.push('\n');
            text.push_str(footer);
            text.push('\n');
        }
        text
    }
}

/// Where a section starts in the merged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub marker: SectionMarker,

    /// Global number of the section's first content page
    pub first_page: usize,
}

/// Cover and content pages of one category, numbered continuously
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub pages: Vec<StampedPage>,
    pub cover_pages: usize,
    pub outline: Vec<OutlineEntry>,
}

impl MergedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn content_pages(&self) -> usize {
        self.pages.len() - self.cover_pages
    }

    /// Renders the whole document, pages separated by a form-feed line
    pub fn render(&self) -> String {
        let separator = format!("{}\n", PAGE_SEPARATOR);
        self.pages
            .iter()
            .map(StampedPage::render)
            .collect::<Vec<_>>()
            .join(separator.as_str())
    }
}

/// Merges covers and sections into numbered documents
#[derive(Debug, Clone)]
pub struct DocumentMerger {
    attribution: String,
    page_width: usize,
}

impl DocumentMerger {
    /// Creates a merger
    ///
    /// # Arguments
    ///
    /// * `attribution` - Text on the left of every content page footer
    /// * `page_width` - Column the page number is right-aligned to
    pub fn new(attribution: impl Into<String>, page_width: usize) -> Self {
        Self {
            attribution: attribution.into(),
            page_width,
        }
    }

    /// Merges a cover and sections into one document
    ///
    /// Sections are ordered by page index regardless of input order. The page
    /// count of the result is the cover page count plus the content pages of
    /// every section.
    pub fn merge(&self, cover: Vec<Page>, mut sections: Vec<Section>) -> MergedDocument {
        sections.sort_by_key(|section| section.page_index);

        let cover_pages = cover.len();
        let content_total: usize = sections.iter().map(|s| s.pages.len()).sum();

        let mut pages = Vec::with_capacity(cover_pages + content_total);
        pages.extend(cover.into_iter().map(StampedPage::cover));

        let mut outline = Vec::new();
        let mut counter = cover_pages;

        for section in sections {
            if section.pages.is_empty() {
                tracing::debug!("Section for page {} has no pages", section.page_index);
                continue;
            }

            outline.push(OutlineEntry {
                marker: section.marker,
                first_page: counter + 1,
            });

            for page in section.pages {
                counter += 1;
                pages.push(StampedPage {
                    body: page.body,
                    number: Some(counter),
                    footer: Some(stamp_footer(&self.attribution, counter, self.page_width)),
                });
            }
        }

        MergedDocument {
            pages,
            cover_pages,
            outline,
        }
    }
}

/// Builds a footer line: attribution on the left, page number right-aligned
/// to `width` (at least one space between them)
pub fn stamp_footer(attribution: &str, number: usize, width: usize) -> String {
    let number = number.to_string();
    let used = attribution.chars().count() + number.len();
    let padding = width.saturating_sub(used).max(1);
    format!("{}{}{}", attribution, " ".repeat(padding), number)
}

/// Builds the artifact file name for a category
pub fn artifact_file_name(prefix: &str, category: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.md",
        prefix,
        category,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Writes a merged document to `path` as UTF-8 text
pub fn write_artifact(document: &MergedDocument, path: &Path) -> RenderResult<()> {
    let mut file = File::create(path)?;
    file.write_all(document.render().as_bytes())?;
    file.sync_all()?;

    tracing::info!(
        "Wrote {} ({} pages, {} content pages in {} sections)",
        path.display(),
        document.page_count(),
        document.content_pages(),
        document.outline.len()
    );

    Ok(())
}
