/// Crawl phase definitions for one category session
///
/// This module defines every phase a crawl session passes through and the
/// legal transitions between them.
use std::fmt;

/// Represents the current phase of a category crawl
///
/// Each page travels `Fetching → Deduping → Enriching → Persisting → Building`
/// before the next page is fetched. The page index is carried by every
/// per-page phase so a skipped or repeated page is a detectable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Initial State =====
    /// Session created, output directories not yet prepared
    Idle,

    // ===== Per-Page States =====
    /// Fetching the given 1-based page from the search API
    Fetching(u32),

    /// Filtering the page's records against the seen-id set
    Deduping(u32),

    /// Running detail and image enrichment for the page
    Enriching(u32),

    /// Appending the page's records to the row store
    Persisting(u32),

    /// Rendering the page's section
    Building(u32),

    // ===== Terminal States =====
    /// Category finished: end of results, a repeated page, a page limit,
    /// or a fatal page fetch error
    EndOfCategory,

    /// Session could not start (e.g. output directories not creatable)
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndOfCategory | Self::Aborted)
    }

    /// Returns true if moving from `self` to `next` is legal
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (*self, next) {
            (Idle, Fetching(1)) | (Idle, Aborted) => true,
            (Fetching(p), Deduping(q)) => p == q,
            (Fetching(_), EndOfCategory) => true,
            (Deduping(p), Enriching(q)) => p == q,
            (Deduping(_), EndOfCategory) => true,
            (Enriching(p), Persisting(q)) => p == q,
            (Persisting(p), Building(q)) => p == q,
            (Building(p), Fetching(q)) => q == p + 1,
            (Building(_), EndOfCategory) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching(p) => write!(f, "fetching page {}", p),
            Self::Deduping(p) => write!(f, "deduping page {}", p),
            Self::Enriching(p) => write!(f, "enriching page {}", p),
            Self::Persisting(p) => write!(f, "persisting page {}", p),
            Self::Building(p) => write!(f, "building page {}", p),
            Self::EndOfCategory => write!(f, "end of category"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}
