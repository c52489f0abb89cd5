//! HTML parser for detail pages
//!
//! This module extracts the enrichment data from a record's detail page:
//! - The description text (first `div.description` element)
//! - The credits block values, joined into a single author string

use crate::record::DetailInfo;
use scraper::{ElementRef, Html, Selector};

/// Selector for the description block
const DESCRIPTION_SELECTOR: &str = "div.description";

/// Selector for credit values; both the label/value list and the
/// definition-list layouts of the credits block are accepted
const CREDIT_VALUE_SELECTOR: &str = ".credits .value, dl.credits dd";

/// Parses a detail page into its description and author credits
///
/// # Extraction Rules
///
/// - `description`: whitespace-normalized text of the first element matching
///   `div.description`, or an empty string when there is none
/// - `author`: every non-empty credit value in document order, joined with
///   `", "`; empty when the credits block is missing or has no values
///
/// # Example
///
/// ```
/// use reddot_folio::crawler::parse_detail_html;
///
/// let html = r#"<div class="description"> A folding chair. </div>
///     <ul class="credits">
///       <li><span class="label">Manufacturer</span><span class="value">Acme</span></li>
///       <li><span class="label">Design</span><span class="value">Jane Doe</span></li>
///     </ul>"#;
/// let detail = parse_detail_html(html);
/// assert_eq!(detail.description, "A folding chair.");
/// assert_eq!(detail.author, "Acme, Jane Doe");
/// ```
pub fn parse_detail_html(html: &str) -> DetailInfo {
    let document = Html::parse_document(html);

    DetailInfo {
        description: extract_description(&document).unwrap_or_default(),
        author: extract_credits(&document).join(", "),
    }
}

fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(DESCRIPTION_SELECTOR).ok()?;
    document.select(&selector).next().map(element_text)
}

fn extract_credits(document: &Html) -> Vec<String> {
    let selector = match Selector::parse(CREDIT_VALUE_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|value| !value.is_empty())
        .collect()
}

/// Collects an element's text with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
