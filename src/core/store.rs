//! In-memory document store with archive-before-write history

use serde::{Deserialize, Serialize};

use super::document::{generate_id, Document, DocumentDraft, DocumentType, Organism};
use super::error::{BulletinError, Result};
use super::ledger::{VersionLedger, VersionRecord, VersionsFile};

/// On-disk shape of `data.json`; also the payload of every version record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Whole store state for backup and restore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub documents: Vec<Document>,
    pub versions: Vec<VersionRecord>,
}

/// Conjunction of optional predicates; `None` leaves a predicate out
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub organism: Option<Organism>,
    pub search: Option<String>,
    pub doc_type: Option<DocumentType>,
    pub year: Option<i32>,
    pub category: Option<String>,
}

impl DocumentFilter {
    pub fn organism(mut self, organism: Organism) -> Self {
        self.organism = Some(organism);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn doc_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = Some(doc_type);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(organism) = self.organism {
            if doc.organism != organism {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref() {
            if !doc.matches_search(term) {
                return false;
            }
        }
        if let Some(doc_type) = self.doc_type {
            if doc.doc_type != doc_type {
                return false;
            }
        }
        if let Some(year) = self.year {
            if doc.year() != Some(year) {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref() {
            if doc.category() != category {
                return false;
            }
        }
        true
    }
}

/// Document counts for the overview header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub by_type: Vec<(DocumentType, usize)>,
}

/// Owns the live documents and their version ledger
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    ledger: VersionLedger,
}

impl DocumentStore {
    pub fn new(ledger_capacity: usize) -> Self {
        Self {
            documents: Vec::new(),
            ledger: VersionLedger::new(ledger_capacity),
        }
    }

    /// Build from a loaded `data.json` and its ledger
    pub fn with_ledger(data: Collection, ledger: VersionLedger) -> Self {
        Self {
            documents: data.documents,
            ledger,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Deep copy of the live documents
    pub fn collection(&self) -> Collection {
        Collection {
            documents: self.documents.clone(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Filtered documents, newest publication date first
    pub fn list(&self, filter: &DocumentFilter) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.documents.iter().filter(|d| filter.matches(d)).collect();
        docs.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::debug!("Filter matched {} of {} documents", docs.len(), self.documents.len());
        docs
    }

    /// Filtered documents grouped by organism in display order; empty groups are skipped
    pub fn grouped_by_organism(&self, filter: &DocumentFilter) -> Vec<(Organism, Vec<&Document>)> {
        let docs = self.list(filter);
        Organism::ALL
            .into_iter()
            .filter_map(|organism| {
                let group: Vec<&Document> =
                    docs.iter().copied().filter(|d| d.organism == organism).collect();
                (!group.is_empty()).then_some((organism, group))
            })
            .collect()
    }

    /// Distinct publication years, newest first
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.documents.iter().filter_map(Document::year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total: self.documents.len(),
            by_type: DocumentType::ALL
                .into_iter()
                .map(|t| (t, self.documents.iter().filter(|d| d.doc_type == t).count()))
                .collect(),
        }
    }

    /// Add a new document with a fresh id and version 1
    pub fn create(&mut self, draft: &DocumentDraft) -> Result<Document> {
        let doc = draft.build(generate_id(), 1)?;
        self.documents.push(doc.clone());
        tracing::info!("Created document {} ({})", doc.id, doc.title);
        Ok(doc)
    }

    /// Like [`create`](Self::create), archiving the prior collection first
    pub fn create_archived(&mut self, draft: &DocumentDraft, changes: &str, author: &str) -> Result<Document> {
        require_changes(changes)?;
        let doc = draft.build(generate_id(), 1)?;
        self.archive(author, changes);
        self.documents.push(doc.clone());
        tracing::info!("Created document {} ({})", doc.id, doc.title);
        Ok(doc)
    }

    /// Replace a document's fields, bumping its version by one
    pub fn update(&mut self, id: &str, draft: &DocumentDraft, changes: &str, author: &str) -> Result<Document> {
        require_changes(changes)?;
        let index = self.position(id)?;

        let current = &self.documents[index];
        let version = current
            .version
            .checked_add(1)
            .ok_or_else(|| BulletinError::validation(format!("{} has reached the last version number", id)))?;
        let mut doc = draft.build(current.id.clone(), version)?;
        doc.extra = current.extra.clone();

        self.archive(author, changes);
        self.documents[index] = doc.clone();
        tracing::info!("Updated document {} to v{}", doc.id, doc.version);
        Ok(doc)
    }

    pub fn delete(&mut self, id: &str, changes: &str, author: &str) -> Result<Document> {
        require_changes(changes)?;
        let index = self.position(id)?;

        self.archive(author, changes);
        let removed = self.documents.remove(index);
        tracing::info!("Deleted document {}", removed.id);
        Ok(removed)
    }

    /// Swap in a whole collection, e.g. from the raw JSON editor
    pub fn replace_documents(&mut self, collection: Collection, changes: &str, author: &str) -> Result<()> {
        require_changes(changes)?;
        self.archive(author, changes);
        self.documents = collection.documents;
        tracing::info!("Replaced collection ({} documents)", self.documents.len());
        Ok(())
    }

    /// Commit a snapshot previewed through [`VersionLedger::restore`]
    pub fn apply_restore(&mut self, version_id: &str, changes: &str, author: &str) -> Result<()> {
        require_changes(changes)?;
        let snapshot = self.ledger.restore(version_id)?.clone();
        self.replace_documents(snapshot, changes, author)
    }

    /// Archive the current collection without changing it
    pub fn record_version(&mut self, changes: &str, author: &str) -> Result<&VersionRecord> {
        require_changes(changes)?;
        Ok(self.archive(author, changes))
    }

    pub fn export_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            documents: self.documents.clone(),
            versions: self.ledger.records().to_vec(),
        }
    }

    /// Replace documents and ledger wholesale
    pub fn import_snapshot(&mut self, snapshot: StoreSnapshot) {
        let capacity = self.ledger.capacity();
        self.documents = snapshot.documents;
        self.ledger = VersionLedger::from_file(
            VersionsFile {
                versions: snapshot.versions,
            },
            capacity,
        );
        tracing::info!(
            "Imported {} documents and {} versions",
            self.documents.len(),
            self.ledger.len()
        );
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| BulletinError::document_not_found(id))
    }

    fn archive(&mut self, author: &str, changes: &str) -> &VersionRecord {
        let snapshot = self.collection();
        self.ledger.record(snapshot, author, changes)
    }
}

fn require_changes(changes: &str) -> Result<()> {
    if changes.trim().is_empty() {
        return Err(BulletinError::validation("a description of the changes is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, organism: &str, doc_type: &str, date: i64) -> DocumentDraft {
        DocumentDraft {
            organism: organism.into(),
            doc_type: doc_type.into(),
            title: title.into(),
            date,
            ..Default::default()
        }
    }

    // 2024-06-01 and 2025-06-01, UTC
    const Y2024: i64 = 1717200000;
    const Y2025: i64 = 1748736000;

    fn seeded() -> DocumentStore {
        let mut store = DocumentStore::new(50);
        store.create(&draft("Boletín antiguo", "grouvex", "bo", Y2024)).unwrap();
        store.create(&draft("Nota de Records", "records", "no", Y2025)).unwrap();
        store.create(&draft("Boletín nuevo", "grouvex", "bo", Y2025 + 10)).unwrap();
        store
    }

    #[test]
    fn test_create_assigns_id_and_version() {
        let mut store = DocumentStore::new(50);
        let doc = store.create(&draft("Test", "grouvex", "bo", 0)).unwrap();
        assert!(doc.id.starts_with("doc_"));
        assert_eq!(doc.version, 1);
        assert_eq!(store.get(&doc.id), Some(&doc));
        assert!(store.ledger().is_empty());
    }

    #[test]
    fn test_create_rejects_invalid_structure() {
        let mut store = DocumentStore::new(50);
        let mut bad = draft("Test", "grouvex", "bo", 0);
        bad.structure = Some("[{\"type\":".into());
        assert!(matches!(store.create(&bad), Err(BulletinError::Validation(_))));
        assert!(store.documents().is_empty());
    }

    #[test]
    fn test_list_orders_by_date_desc() {
        let store = seeded();
        let titles: Vec<_> = store
            .list(&DocumentFilter::default())
            .iter()
            .map(|d| d.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Boletín nuevo", "Nota de Records", "Boletín antiguo"]);
    }

    #[test]
    fn test_list_filters_are_conjunctive() {
        let store = seeded();

        let filter = DocumentFilter::default().organism(Organism::Grouvex).year(2025);
        let docs = store.list(&filter);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Boletín nuevo");

        let filter = DocumentFilter::default().search("BOLETÍN").doc_type(DocumentType::Bo);
        assert_eq!(store.list(&filter).len(), 2);

        let filter = DocumentFilter::default().doc_type(DocumentType::Tos);
        assert!(store.list(&filter).is_empty());
    }

    #[test]
    fn test_list_filters_by_category() {
        let mut store = seeded();
        store.documents[1]
            .extra
            .insert("category".into(), "prensa".into());

        let docs = store.list(&DocumentFilter::default().category("prensa"));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Nota de Records");

        let docs = store.list(&DocumentFilter::default().category("general"));
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.category() == "general"));

        let filter = DocumentFilter::default().category("prensa").organism(Organism::Grouvex);
        assert!(store.list(&filter).is_empty());
    }

    #[test]
    fn test_update_at_last_version_number_is_rejected() {
        let mut store = seeded();
        let id = store.documents[0].id.clone();
        store.documents[0].version = u32::MAX;

        let result = store.update(&id, &draft("Otro", "grouvex", "bo", Y2024), "Cambio", "admin@grouvex.com");
        assert!(matches!(result, Err(BulletinError::Validation(_))));
        assert_eq!(store.documents[0].version, u32::MAX);
        assert!(store.ledger().is_empty());
    }

    #[test]
    fn test_update_increments_version_and_archives_prior_state() {
        let mut store = seeded();
        let id = store.documents()[0].id.clone();
        let before = store.collection();

        let updated = store
            .update(&id, &draft("Boletín corregido", "grouvex", "bo", Y2024), "Corrección", "admin@grouvex.com")
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.version, 2);
        assert_eq!(store.ledger().len(), 1);

        let record = &store.ledger().records()[0];
        assert_eq!(record.data, before);
        assert_eq!(record.author, "admin@grouvex.com");
        assert_eq!(record.changes, "Corrección");

        let history = store.ledger().list_for(&id);
        assert_eq!(history[0].document.title, "Boletín antiguo");
        assert_eq!(history[0].document.version, 1);
    }

    #[test]
    fn test_update_errors_leave_store_untouched() {
        let mut store = seeded();
        let id = store.documents()[0].id.clone();

        assert!(matches!(
            store.update("missing", &draft("T", "grouvex", "bo", 0), "c", "a"),
            Err(BulletinError::NotFound { entity: "document", .. })
        ));
        assert!(matches!(
            store.update(&id, &draft("T", "grouvex", "bo", 0), "  ", "a"),
            Err(BulletinError::Validation(_))
        ));
        assert!(matches!(
            store.update(&id, &draft("", "grouvex", "bo", 0), "c", "a"),
            Err(BulletinError::Validation(_))
        ));

        assert!(store.ledger().is_empty());
        assert_eq!(store.documents()[0].version, 1);
    }

    #[test]
    fn test_snapshots_do_not_alias_live_documents() {
        let mut store = seeded();
        let id = store.documents()[0].id.clone();
        store.update(&id, &draft("Uno", "grouvex", "bo", 0), "c1", "a").unwrap();
        store.update(&id, &draft("Dos", "grouvex", "bo", 0), "c2", "a").unwrap();

        let history = store.ledger().list_for(&id);
        assert_eq!(history[0].document.title, "Uno");
        assert_eq!(history[1].document.title, "Boletín antiguo");
        assert_eq!(store.get(&id).unwrap().title, "Dos");
    }

    #[test]
    fn test_delete_archives_then_removes() {
        let mut store = seeded();
        let id = store.documents()[1].id.clone();

        store.delete(&id, "Documento eliminado", "admin").unwrap();
        assert!(store.get(&id).is_none());
        assert_eq!(store.ledger().list_for(&id).len(), 1);
        assert!(store.delete(&id, "again", "admin").is_err());
    }

    #[test]
    fn test_restore_is_explicit() {
        let mut store = seeded();
        let id = store.documents()[0].id.clone();
        store.delete(&id, "borrado", "admin").unwrap();
        let version_id = store.ledger().records()[0].id.clone();

        let preview = store.ledger().restore(&version_id).unwrap().clone();
        assert_eq!(preview.documents.len(), 3);
        assert!(store.get(&id).is_none());

        store.apply_restore(&version_id, "Restaurar", "admin").unwrap();
        assert!(store.get(&id).is_some());
        assert_eq!(store.ledger().len(), 2);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = seeded();
        let id = store.documents()[0].id.clone();
        store.delete(&id, "borrado", "admin").unwrap();

        let snapshot = store.export_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut other = DocumentStore::new(50);
        other.create(&draft("Se pierde", "games", "tos", 0)).unwrap();
        other.import_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(other.documents(), store.documents());
        assert_eq!(other.ledger().records(), store.ledger().records());
        assert_eq!(other.export_snapshot(), snapshot);
    }

    #[test]
    fn test_years_stats_and_groups() {
        let store = seeded();
        assert_eq!(store.years(), vec![2025, 2024]);

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type[0], (DocumentType::Bo, 2));

        let groups = store.grouped_by_organism(&DocumentFilter::default());
        let organisms: Vec<_> = groups.iter().map(|(o, _)| *o).collect();
        assert_eq!(organisms, vec![Organism::Grouvex, Organism::Records]);
        assert_eq!(groups[0].1.len(), 2);
    }
}
