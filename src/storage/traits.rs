//! Storage traits and error types
//!
//! This module defines the trait interface for row store backends and
//! associated error types.

use crate::record::EnrichedRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for append-only row stores
///
/// A row store receives each page's enriched records exactly once. Rows
/// written by earlier calls are never rewritten, so everything appended
/// before a crash remains readable.
pub trait RowStore {
    /// Appends one page of records
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn append_page(&mut self, records: &[EnrichedRecord]) -> StorageResult<usize>;

    /// Location of the store
    fn path(&self) -> &Path;
}
