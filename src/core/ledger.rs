//! Capped, newest-first history of full-collection snapshots

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::error::{BulletinError, Result};
use super::store::Collection;
use super::time;

/// One archived state of the whole collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    /// Unix seconds when the record was taken
    #[serde(alias = "date")]
    pub timestamp: i64,
    pub author: String,
    pub changes: String,
    pub data: Collection,
}

/// On-disk shape of `versions.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionsFile {
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

/// A ledger entry paired with one document's state inside it
#[derive(Debug, Clone, Copy)]
pub struct DocumentVersion<'a> {
    pub record: &'a VersionRecord,
    pub document: &'a Document,
}

/// The ledger. Records are owned copies; nothing aliases the live store.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionLedger {
    records: Vec<VersionRecord>,
    capacity: usize,
    /// The stored history could not be read and must not be overwritten
    unreadable: bool,
}

impl Default for VersionLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl VersionLedger {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.max(1),
            unreadable: false,
        }
    }

    /// Empty stand-in for a history that failed to load
    pub fn unreadable(capacity: usize) -> Self {
        Self {
            unreadable: true,
            ..Self::new(capacity)
        }
    }

    pub fn is_unreadable(&self) -> bool {
        self.unreadable
    }

    /// Rebuild from a loaded `versions.json`, keeping its order
    pub fn from_file(file: VersionsFile, capacity: usize) -> Self {
        let mut ledger = Self::new(capacity);
        ledger.records = file.versions;
        ledger.records.truncate(ledger.capacity);
        ledger
    }

    pub fn to_file(&self) -> VersionsFile {
        VersionsFile {
            versions: self.records.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, newest first
    pub fn records(&self) -> &[VersionRecord] {
        &self.records
    }

    /// Prepend a snapshot and evict the oldest entries beyond capacity
    pub fn record(&mut self, snapshot: Collection, author: &str, changes: &str) -> &VersionRecord {
        let record = VersionRecord {
            id: uuid::Uuid::now_v7().to_string(),
            timestamp: time::now(),
            author: author.to_string(),
            changes: changes.to_string(),
            data: snapshot,
        };

        self.records.insert(0, record);
        if self.records.len() > self.capacity {
            let evicted = self.records.len() - self.capacity;
            self.records.truncate(self.capacity);
            tracing::debug!("Evicted {} version(s) beyond capacity {}", evicted, self.capacity);
        }

        &self.records[0]
    }

    /// Records whose snapshot contains the document, newest first
    pub fn list_for(&self, document_id: &str) -> Vec<DocumentVersion<'_>> {
        self.records
            .iter()
            .filter_map(|record| {
                record
                    .data
                    .documents
                    .iter()
                    .find(|d| d.id == document_id)
                    .map(|document| DocumentVersion { record, document })
            })
            .collect()
    }

    /// Preview a stored snapshot. Applying it is a separate, explicit step.
    pub fn restore(&self, version_id: &str) -> Result<&Collection> {
        self.records
            .iter()
            .find(|r| r.id == version_id)
            .map(|r| &r.data)
            .ok_or_else(|| BulletinError::version_not_found(version_id))
    }

    /// Plain-text listing of the whole history
    pub fn history_report(&self) -> String {
        let mut report = String::from("HISTORIAL COMPLETO DE VERSIONES\n\n");
        for (index, record) in self.records.iter().enumerate() {
            report.push_str(&format!(
                "{}. {} - {}\n",
                index + 1,
                time::long_date(record.timestamp),
                record.author
            ));
            report.push_str(&format!("   Cambios: {}\n", record.changes));
            report.push_str(&format!("   ID: {}\n\n", record.id));
        }
        report
    }
}
