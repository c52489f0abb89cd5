//! Per-category crawl statistics
//!
//! This module provides the counters collected during a category session
//! and the end-of-run summary printed by the binary.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

/// How a category session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The API returned a page without entries
    EndOfResults,

    /// A non-empty page contained only records already seen
    RepeatedPage(u32),

    /// The configured page limit was reached
    PageLimit(u32),

    /// A non-empty page had no entry that passed validation
    NoValidRecords(u32),

    /// Every new record of a page was lost during enrichment
    EnrichmentFailed(u32),

    /// A page fetch failed after exhausting retries
    FatalError(String),

    /// The session could not start
    Aborted(String),
}

impl SessionOutcome {
    /// Returns true if the session ended without a fetch or setup failure
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::EndOfResults | Self::RepeatedPage(_) | Self::PageLimit(_)
        )
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfResults => write!(f, "end of results"),
            Self::RepeatedPage(page) => write!(f, "page {} repeated earlier records", page),
            Self::PageLimit(limit) => write!(f, "page limit {} reached", limit),
            Self::NoValidRecords(page) => write!(f, "page {} had no valid entries", page),
            Self::EnrichmentFailed(page) => {
                write!(f, "every record of page {} failed enrichment", page)
            }
            Self::FatalError(message) => write!(f, "fetch failed: {}", message),
            Self::Aborted(message) => write!(f, "aborted: {}", message),
        }
    }
}

/// Counters for one category session
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub category: String,

    /// Search pages that returned a usable response
    pub pages_fetched: u32,

    /// Valid entries received from the API, before deduplication
    pub records_received: usize,

    pub duplicates_skipped: usize,

    /// Records without an identity, passed through unfiltered
    pub unidentified_records: usize,

    /// Records that came out of the enrichment pool
    pub records_enriched: usize,

    /// Records lost to failed enrichment tasks
    pub enrichment_failures: usize,

    pub details_degraded: usize,

    pub images_missing: usize,

    pub rows_persisted: usize,

    pub sections_built: usize,

    /// Path of the merged document, if one was written
    pub artifact: Option<PathBuf>,

    pub outcome: SessionOutcome,
}

impl CrawlStatistics {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            pages_fetched: 0,
            records_received: 0,
            duplicates_skipped: 0,
            unidentified_records: 0,
            records_enriched: 0,
            enrichment_failures: 0,
            details_degraded: 0,
            images_missing: 0,
            rows_persisted: 0,
            sections_built: 0,
            artifact: None,
            outcome: SessionOutcome::EndOfResults,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - One entry per category, in crawl order
pub fn print_statistics(stats: &[CrawlStatistics]) {
    let stdout = io::stdout();
    if let Err(e) = write_statistics(&mut stdout.lock(), stats) {
        tracing::warn!("Failed to print statistics: {}", e);
    }
}

/// Writes the statistics summary to `out`
pub fn write_statistics<W: Write>(out: &mut W, stats: &[CrawlStatistics]) -> io::Result<()> {
    writeln!(out, "=== Crawl Statistics ===\n")?;

    for entry in stats {
        writeln!(out, "Category: {}", entry.category)?;
        writeln!(out, "  Outcome: {}", entry.outcome)?;
        writeln!(out, "  Pages fetched: {}", entry.pages_fetched)?;
        writeln!(
            out,
            "  Records: {} received, {} duplicates skipped, {} without identity",
            entry.records_received, entry.duplicates_skipped, entry.unidentified_records
        )?;
        writeln!(
            out,
            "  Enriched: {} ({} task failures, {} without details, {} without images)",
            entry.records_enriched,
            entry.enrichment_failures,
            entry.details_degraded,
            entry.images_missing
        )?;
        writeln!(out, "  Rows persisted: {}", entry.rows_persisted)?;
        writeln!(out, "  Sections built: {}", entry.sections_built)?;
        match &entry.artifact {
            Some(path) => writeln!(out, "  Document: {}", path.display())?,
            None => writeln!(out, "  Document: (none)")?,
        }
        writeln!(out)?;
    }

    let total: usize = stats.iter().map(|s| s.records_enriched).sum();
    let failed = stats.iter().filter(|s| !s.outcome.is_success()).count();
    writeln!(
        out,
        "Total: {} records across {} categories ({} ended early)",
        total,
        stats.len(),
        failed
    )
}
