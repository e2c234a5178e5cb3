//! In-memory composite-key state store for testing.
//!
//! `MemStore` keeps `(key, field)` pairs under the host's composite key
//! (`key#field`, or `key` alone when the field is empty) in a `BTreeMap`,
//! so scans come back in lexicographic composite-key order. Every write and
//! delete is also appended to the pair's history.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Bound;

use sysbridge_primitives::types::composite_key;

/// A live `(key, field) -> value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: String,
    pub field: String,
    pub value: Vec<u8>,
}

/// Transaction metadata stamped onto every history entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxMeta {
    pub tx_id: String,
    pub block_height: i32,
    pub timestamp: String,
}

/// One recorded change to a `(key, field)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub value: Vec<u8>,
    pub tx_id: String,
    pub block_height: i32,
    pub is_delete: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemStore {
    entries: BTreeMap<String, StoredEntry>,
    history: BTreeMap<String, Vec<HistoryEntry>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, field: &str) -> Option<&[u8]> {
        self.entries
            .get(&composite_key(key, field))
            .map(|entry| entry.value.as_slice())
    }

    pub fn put(&mut self, key: &str, field: &str, value: &[u8], meta: &TxMeta) {
        let composite = composite_key(key, field);
        self.push_history(&composite, value, false, meta);
        self.entries.insert(
            composite,
            StoredEntry {
                key: String::from(key),
                field: String::from(field),
                value: value.to_vec(),
            },
        );
    }

    /// Remove a pair. Deleting a missing pair still records a tombstone.
    pub fn delete(&mut self, key: &str, field: &str, meta: &TxMeta) {
        let composite = composite_key(key, field);
        self.entries.remove(&composite);
        self.push_history(&composite, &[], true, meta);
    }

    /// Entries with `start <= composite < limit`.
    pub fn range(&self, start: &str, limit: &str) -> Vec<StoredEntry> {
        if start >= limit {
            return Vec::new();
        }
        self.entries
            .range::<str, _>((Bound::Included(start), Bound::Excluded(limit)))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Entries whose composite key starts with `prefix`.
    pub fn prefix(&self, prefix: &str) -> Vec<StoredEntry> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(composite, _)| composite.starts_with(prefix))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Recorded changes to one pair, oldest first.
    pub fn history(&self, key: &str, field: &str) -> Vec<HistoryEntry> {
        self.history
            .get(&composite_key(key, field))
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_history(&mut self, composite: &str, value: &[u8], is_delete: bool, meta: &TxMeta) {
        self.history
            .entry(String::from(composite))
            .or_default()
            .push(HistoryEntry {
                value: value.to_vec(),
                tx_id: meta.tx_id.clone(),
                block_height: meta.block_height,
                is_delete,
                timestamp: meta.timestamp.clone(),
            });
    }
}
