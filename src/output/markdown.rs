//! Markdown rendering collaborator
//!
//! Renders one page per record and a single cover page. Image references are
//! relative to the category directory, where the merged document is written.

use crate::output::traits::{
    CoverDescriptor, Page, RenderError, RenderResult, Section, SectionMarker, SectionRenderer,
};
use crate::record::{EnrichedRecord, FIELD_SEQUENCE};
use crate::storage::ASSETS_DIR;

/// Text used when a record has no description
pub const NO_DESCRIPTION: &str = "No description";

/// Line rendered in place of a missing image
pub const IMAGE_PLACEHOLDER: &str = "_Image not available_";

/// Renders sections and covers as Markdown text
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl SectionRenderer for MarkdownRenderer {
    fn render_section(&self, page_index: u32, records: &[EnrichedRecord]) -> RenderResult<Section> {
        let pages = records
            .iter()
            .enumerate()
            .map(|(i, record)| format_record_page(page_index, i + 1, record).map(Page::new))
            .collect::<RenderResult<Vec<_>>>()?;

        Ok(Section {
            page_index,
            marker: SectionMarker {
                page_index,
                record_count: records.len(),
                generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
            pages,
        })
    }

    fn render_cover(&self, cover: &CoverDescriptor) -> RenderResult<Vec<Page>> {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", cover.title));
        md.push_str(&format!("- **Category**: {}\n", cover.category));
        md.push_str(&format!("- **Total designs**: {}\n", cover.total_records));
        md.push_str(&format!("- **Generated**: {}\n\n", cover.generated_at));
        md.push_str(&format!("_{}_\n", cover.attribution));

        Ok(vec![Page::new(md)])
    }
}

/// Formats one record as a page
///
/// # Arguments
///
/// * `page_index` - API page of the record
/// * `position` - 1-based position of the record within its page
/// * `record` - The record to format
pub fn format_record_page(
    page_index: u32,
    position: usize,
    record: &EnrichedRecord,
) -> RenderResult<String> {
    let sequence = record
        .extra
        .get(FIELD_SEQUENCE)
        .cloned()
        .unwrap_or_else(|| format!("{}-{}", page_index, position));

    let description = if record.description.is_empty() {
        NO_DESCRIPTION
    } else {
        record.description.as_str()
    };

    let mut md = String::new();
    md.push_str(&format!("## {} {}\n\n", sequence, record.title));
    md.push_str(&format!("{}\n\n", description));
    md.push_str(&format!("- **Category**: {}\n", record.category));
    md.push_str(&format!("- **Author**: {}\n", record.author));
    md.push_str(&format!("- **Year**: {}\n\n", record.year));

    match &record.local_image_path {
        Some(path) => {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    RenderError::Format(format!("invalid asset path {}", path.display()))
                })?;
            md.push_str(&format!("![{}]({}/{})\n", record.title, ASSETS_DIR, file_name));
        }
        None => {
            md.push_str(IMAGE_PLACEHOLDER);
            md.push('\n');
        }
    }

    Ok(md)
}
