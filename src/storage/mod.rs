//! Storage module for persisting crawl data
//!
//! This module handles everything the crawl writes to disk before rendering:
//! - The append-only CSV row store, one flushed write per page
//! - Content-addressed image assets, written atomically

mod assets;
mod csv_store;
mod traits;

pub use assets::{asset_file_name, extension_for_content_type, store_asset, FALLBACK_EXTENSION};
pub use csv_store::{CsvRowStore, CORE_FIELDS};
pub use traits::{RowStore, StorageError, StorageResult};

use std::path::{Path, PathBuf};

/// File name of the row store inside a category directory
pub const ROW_STORE_FILE: &str = "records.csv";

/// Directory name for image assets inside a category directory
pub const ASSETS_DIR: &str = "assets";

/// On-disk layout of one category's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLayout {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub row_store: PathBuf,
}

impl CategoryLayout {
    pub fn new(category_root: &Path) -> Self {
        Self {
            root: category_root.to_path_buf(),
            assets_dir: category_root.join(ASSETS_DIR),
            row_store: category_root.join(ROW_STORE_FILE),
        }
    }

    /// Creates the category and asset directories
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.assets_dir)
    }
}
