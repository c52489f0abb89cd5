//! State module for tracking crawl progress
//!
//! `CrawlPhase` tracks where a category session is in its page loop and
//! rejects out-of-order transitions.

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
