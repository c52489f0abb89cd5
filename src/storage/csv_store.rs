//! CSV row store implementation
//!
//! This module provides an append-only CSV implementation of the RowStore
//! trait. The header is fixed when the first page is written: the core record
//! columns followed by the extra fields of the first record.

use crate::record::EnrichedRecord;
use crate::storage::traits::{RowStore, StorageError, StorageResult};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Columns present in every row store, in order
pub const CORE_FIELDS: [&str; 9] = [
    "id",
    "title",
    "category",
    "author",
    "year",
    "description",
    "image_url",
    "detail_url",
    "local_image_path",
];

/// Append-only CSV row store
pub struct CsvRowStore {
    path: PathBuf,
    header: Option<Vec<String>>,
}

impl CsvRowStore {
    /// Starts a new store at `path`, discarding a file left by an earlier run
    ///
    /// The file itself is created by the first non-empty `append_page`.
    pub fn create(path: &Path) -> StorageResult<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Discarded previous row store at {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path: path.to_path_buf(),
            header: None,
        })
    }
}

impl RowStore for CsvRowStore {
    fn append_page(&mut self, records: &[EnrichedRecord]) -> StorageResult<usize> {
        let first = match records.first() {
            Some(first) => first,
            None => return Ok(0),
        };

        let (header, write_header) = match &self.header {
            Some(header) => (header.clone(), false),
            None => (header_for(first), true),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(&header)?;
        }
        for record in records {
            writer.write_record(row_values(record, &header))?;
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))?;
        file.sync_all()?;

        if write_header {
            tracing::debug!(
                "Created row store {} with {} columns",
                self.path.display(),
                header.len()
            );
            self.header = Some(header);
        }

        Ok(records.len())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Core columns followed by the record's extra field names (sorted)
fn header_for(record: &EnrichedRecord) -> Vec<String> {
    CORE_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(
            record
                .extra
                .keys()
                .filter(|k| !CORE_FIELDS.contains(&k.as_str()))
                .cloned(),
        )
        .collect()
}

fn row_values(record: &EnrichedRecord, header: &[String]) -> Vec<String> {
    header
        .iter()
        .map(|field| field_value(record, field))
        .collect()
}

fn field_value(record: &EnrichedRecord, field: &str) -> String {
    match field {
        "id" => record.id.clone().unwrap_or_default(),
        "title" => record.title.clone(),
        "category" => record.category.clone(),
        "author" => record.author.clone(),
        "year" => record.year.clone(),
        "description" => record.description.clone(),
        "image_url" => record.image_url.clone(),
        "detail_url" => record.detail_url.clone(),
        "local_image_path" => record
            .local_image_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        other => record.extra.get(other).cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PageBatch, SearchRecord};
    use tempfile::TempDir;

    fn record(id: &str) -> EnrichedRecord {
        let mut record = EnrichedRecord::from_search(SearchRecord {
            id: Some(id.to_string()),
            title: format!("Design \"{}\", v2", id),
            category: "Furniture".to_string(),
            image_url: format!("https://img.example.com/{}.jpg", id),
            author: "Studio".to_string(),
            year: "2024".to_string(),
            detail_url: format!("https://example.com{}", id),
        });
        record.description = "Line one\nline two".to_string();
        record
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let mut store = CsvRowStore::create(&path).unwrap();

        let page1 = PageBatch::new(1, vec![record("/a"), record("/b")]);
        let page2 = PageBatch::new(2, vec![record("/c")]);
        assert_eq!(store.append_page(&page1.records).unwrap(), 2);
        assert_eq!(store.append_page(&page2.records).unwrap(), 1);

        let (header, rows) = read_rows(&path);
        let mut expected: Vec<String> = CORE_FIELDS.iter().map(|f| f.to_string()).collect();
        expected.push("sequence".to_string());
        expected.push("source_page".to_string());
        assert_eq!(header, expected);

        let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["/a", "/b", "/c"]);
        assert_eq!(rows[2][9], "2-1");
        // Quotes, commas and newlines survive the round trip
        assert_eq!(rows[0][1], "Design \"/a\", v2");
        assert_eq!(rows[0][5], "Line one\nline two");
    }

    #[test]
    fn test_each_page_durable_before_next() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let mut store = CsvRowStore::create(&path).unwrap();

        store
            .append_page(&PageBatch::new(1, vec![record("/a"), record("/b")]).records)
            .unwrap();
        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 2);

        store
            .append_page(&PageBatch::new(2, vec![record("/c")]).records)
            .unwrap();
        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_later_extra_fields_follow_first_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let mut store = CsvRowStore::create(&path).unwrap();

        let mut first = record("/a");
        first.extra.insert("award".to_string(), "Best of the Best".to_string());
        store.append_page(&[first]).unwrap();

        let mut second = record("/b");
        second.extra.insert("unknown".to_string(), "dropped".to_string());
        store.append_page(&[second]).unwrap();

        let (header, rows) = read_rows(&path);
        assert_eq!(header.last().unwrap(), "award");
        assert_eq!(rows[0][9], "Best of the Best");
        assert_eq!(rows[1][9], "");
        assert_eq!(rows[1].len(), header.len());
    }

    #[test]
    fn test_empty_page_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        let mut store = CsvRowStore::create(&path).unwrap();

        assert_eq!(store.append_page(&[]).unwrap(), 0);
        assert!(!path.exists());
        assert!(store.header.is_none());
    }

    #[test]
    fn test_create_discards_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(&path, "id,title\n/old,Old\n").unwrap();

        let mut store = CsvRowStore::create(&path).unwrap();
        store.append_page(&[record("/new")]).unwrap();

        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "/new");
    }
}
