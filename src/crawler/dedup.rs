//! Session-scoped record deduplication

use crate::record::SearchRecord;
use std::collections::HashSet;

/// Identities of every record accepted during one category session
///
/// Identities are only ever added; a record that later fails enrichment
/// still counts as seen.
#[derive(Debug, Default)]
pub struct SeenIdSet {
    ids: HashSet<String>,
}

impl SeenIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records an identity, returning false if it was already present
    fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }
}

/// Outcome of filtering one page
#[derive(Debug, Default)]
pub struct DedupResult {
    /// Records not seen before, in input order
    pub accepted: Vec<SearchRecord>,

    /// Number of records dropped as already seen
    pub duplicates: usize,

    /// Number of accepted records that carried no identity
    pub unidentified: usize,
}

/// Filters pages of records against a [`SeenIdSet`]
pub struct Deduplicator<'a> {
    seen: &'a mut SeenIdSet,
}

impl<'a> Deduplicator<'a> {
    pub fn new(seen: &'a mut SeenIdSet) -> Self {
        Self { seen }
    }

    /// Drops records whose identity was already seen this session
    ///
    /// Duplicates within `records` are also dropped, keeping the first
    /// occurrence. Records without an identity pass through with a warning.
    pub fn filter(&mut self, records: Vec<SearchRecord>) -> DedupResult {
        let mut result = DedupResult::default();

        for record in records {
            match record.id.as_deref() {
                Some(id) => {
                    if self.seen.insert(id) {
                        result.accepted.push(record);
                    } else {
                        tracing::debug!("Skipping duplicate record {}", id);
                        result.duplicates += 1;
                    }
                }
                None => {
                    tracing::warn!(
                        "Record '{}' has no identity; it cannot be deduplicated",
                        record.title
                    );
                    result.unidentified += 1;
                    result.accepted.push(record);
                }
            }
        }

        result
    }
}
