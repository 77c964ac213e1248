//! Admin session: an authorized user bound to a store and a publish target

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::auth::{Authorizer, UserProfile};
use crate::core::backup::{self, BackupBundle};
use crate::core::config::AppConfig;
use crate::core::document::{Document, DocumentDraft};
use crate::core::error::{BulletinError, Result};
use crate::core::store::{Collection, DocumentStore};
use crate::core::sync::{self, CommitKind, CommitMessages, PublishOutcome, SyncBackend};
use crate::core::time;

/// Editing state of one signed-in admin
pub struct AdminSession {
    /// Application configuration
    pub config: AppConfig,
    user: UserProfile,
    store: DocumentStore,
    backend: Box<dyn SyncBackend>,
}

impl AdminSession {
    /// Sign in against the configured allow-list and load from the configured backend
    pub fn open(config: AppConfig, user: UserProfile) -> Result<Self> {
        let backend = config.open_backend();
        Self::sign_in(config, user, backend)
    }

    /// Sign in with an explicit backend
    pub fn sign_in(config: AppConfig, user: UserProfile, backend: Box<dyn SyncBackend>) -> Result<Self> {
        let authorizer = Authorizer::from_config(&config.auth);
        if !authorizer.is_authorized(&user.email) {
            tracing::warn!("Rejected sign-in for {}", user.email);
            return Err(BulletinError::Unauthorized(user.email));
        }

        let store = sync::load_store(backend.as_ref(), config.ledger_capacity)?;
        tracing::info!("Signed in as {} ({})", user.email, user.display_name());

        Ok(Self {
            config,
            user,
            store,
            backend,
        })
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn backend(&self) -> &dyn SyncBackend {
        self.backend.as_ref()
    }

    /// Create (`id == None`) or update a document and publish
    pub fn save_document(
        &mut self,
        id: Option<&str>,
        draft: &DocumentDraft,
        changes: &str,
    ) -> Result<(Document, PublishOutcome)> {
        let doc = match id {
            Some(id) => self.store.update(id, draft, changes, &self.user.email)?,
            None => self.store.create_archived(draft, changes, &self.user.email)?,
        };
        let outcome = self.publish(CommitKind::Save, changes)?;
        Ok((doc, outcome))
    }

    pub fn delete_document(&mut self, id: &str, changes: &str) -> Result<(Document, PublishOutcome)> {
        let removed = self.store.delete(id, changes, &self.user.email)?;
        let outcome = self.publish(CommitKind::Delete, changes)?;
        Ok((removed, outcome))
    }

    /// Replace the whole collection from raw editor JSON and publish
    pub fn save_json(&mut self, text: &str, changes: &str) -> Result<PublishOutcome> {
        let collection = parse_collection(text)?;
        self.store.replace_documents(collection, changes, &self.user.email)?;
        self.publish(CommitKind::Save, changes)
    }

    /// Snapshot of a version, for preview before restoring
    pub fn preview_version(&self, version_id: &str) -> Result<&Collection> {
        self.store.ledger().restore(version_id)
    }

    /// Make a version's snapshot live and publish it
    pub fn restore_version(&mut self, version_id: &str, changes: &str) -> Result<PublishOutcome> {
        self.store.apply_restore(version_id, changes, &self.user.email)?;
        self.publish(CommitKind::Save, changes)
    }

    /// Write a full backup into the configured backup directory
    pub fn export_backup(&self) -> Result<PathBuf> {
        let bundle = BackupBundle::from_store(&self.store, Some(&self.user.email), time::now());
        Ok(backup::write_backup(&self.config.backup_dir(), &bundle)?)
    }

    /// Replace documents and history with a backup's contents and publish
    pub fn import_backup(&mut self, path: &Path, changes: &str) -> Result<PublishOutcome> {
        let bundle = backup::read_backup(path)?;
        self.store.import_snapshot(bundle.into_snapshot());
        self.publish(CommitKind::Save, changes)
    }

    pub fn history_report(&self) -> String {
        self.store.ledger().history_report()
    }

    fn publish(&mut self, kind: CommitKind, changes: &str) -> Result<PublishOutcome> {
        let messages = CommitMessages::new(kind, changes, &self.user.email, time::now());
        let fallback = self.config.fallback_dir();
        Ok(sync::publish(&self.store, self.backend.as_mut(), &fallback, &messages)?)
    }
}

/// Parse raw editor text; it must be an object with a `documents` array
pub fn parse_collection(text: &str) -> Result<Collection> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BulletinError::validation(format!("invalid JSON: {}", e)))?;

    if !value.get("documents").is_some_and(Value::is_array) {
        return Err(BulletinError::validation(
            "JSON must contain a \"documents\" array",
        ));
    }

    serde_json::from_value(value).map_err(|e| BulletinError::validation(format!("invalid document: {}", e)))
}

/// Pretty-print JSON with two-space indentation
pub fn format_json(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BulletinError::validation(format!("invalid JSON: {}", e)))?;
    serde_json::to_string_pretty(&value).map_err(|e| BulletinError::validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BackendConfig;
    use crate::core::sync::{MemoryBackend, DATA_FILE, VERSIONS_FILE};

    const ADMIN: &str = "admin@grouvex.com";

    fn config(dir: &Path) -> AppConfig {
        AppConfig {
            data_dir: Some(dir.to_path_buf()),
            backend: BackendConfig::Memory,
            ..Default::default()
        }
    }

    fn draft(title: &str) -> DocumentDraft {
        DocumentDraft {
            organism: "records".into(),
            doc_type: "no".into(),
            title: title.into(),
            content: "Texto".into(),
            ..Default::default()
        }
    }

    fn session(dir: &Path, backend: MemoryBackend) -> AdminSession {
        AdminSession::sign_in(config(dir), UserProfile::new(ADMIN), Box::new(backend)).unwrap()
    }

    #[test]
    fn test_unauthorized_user_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = AdminSession::sign_in(
            config(dir.path()),
            UserProfile::new("intruso@example.com"),
            Box::new(MemoryBackend::new()),
        );
        assert!(matches!(result, Err(BulletinError::Unauthorized(_))));
    }

    #[test]
    fn test_save_publishes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), MemoryBackend::new());

        let (doc, outcome) = session.save_document(None, &draft("Nota"), "Nueva nota").unwrap();
        assert!(matches!(outcome, PublishOutcome::Synced));
        assert_eq!(session.store().documents().len(), 1);
        assert_eq!(session.store().ledger().len(), 1);

        let (updated, _) = session
            .save_document(Some(&doc.id), &draft("Nota corregida"), "Corrección")
            .unwrap();
        assert_eq!(updated.version, 2);

        let backend = session.backend();
        let data = backend.read(DATA_FILE).unwrap().unwrap();
        assert!(data.contains("Nota corregida"));
        let versions = backend.read(VERSIONS_FILE).unwrap().unwrap();
        assert!(versions.contains("Corrección"));
    }

    #[test]
    fn test_failed_publish_falls_back_to_manual_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MemoryBackend::new();
        backend.fail_writes_to(VERSIONS_FILE);
        let mut session = session(dir.path(), backend);

        let (_, outcome) = session.save_document(None, &draft("Nota"), "Nueva nota").unwrap();
        match outcome {
            PublishOutcome::ManualSave {
                inconsistent, files, ..
            } => {
                assert!(inconsistent);
                assert_eq!(files.len(), 2);
                assert!(files.iter().all(|f| f.starts_with(dir.path().join("manual"))));
                assert!(files.iter().all(|f| f.exists()));
            }
            other => panic!("expected manual save, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), MemoryBackend::new());

        let (doc, _) = session.save_document(None, &draft("Nota"), "Alta").unwrap();
        session.delete_document(&doc.id, "Baja").unwrap();
        assert!(session.store().get(&doc.id).is_none());

        // Newest record holds the collection as it was before the delete
        let version_id = session.store().ledger().records()[0].id.clone();
        assert_eq!(session.preview_version(&version_id).unwrap().documents.len(), 1);
        assert!(session.store().get(&doc.id).is_none());

        session.restore_version(&version_id, "Restaurar").unwrap();
        assert!(session.store().get(&doc.id).is_some());
    }

    #[test]
    fn test_save_json_requires_documents_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), MemoryBackend::new());

        let err = session.save_json(r#"{"docs": []}"#, "Editor").unwrap_err();
        assert!(matches!(err, BulletinError::Validation(_)));
        let err = session.save_json("{", "Editor").unwrap_err();
        assert!(matches!(err, BulletinError::Validation(_)));
        assert!(session.store().ledger().is_empty());

        session
            .save_json(
                r#"{"documents": [{"id": "doc_1", "organism": "games", "type": "tos", "title": "ToS"}]}"#,
                "Editor",
            )
            .unwrap();
        assert_eq!(session.store().documents()[0].id, "doc_1");
    }

    #[test]
    fn test_backup_export_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), MemoryBackend::new());
        session.save_document(None, &draft("Nota"), "Alta").unwrap();

        let path = session.export_backup().unwrap();
        assert!(path.starts_with(dir.path().join("backups")));
        let exported = session.store().export_snapshot();

        let mut other = AdminSession::sign_in(
            config(dir.path()),
            UserProfile::new("ADMIN@grouvex.com"),
            Box::new(MemoryBackend::new()),
        )
        .unwrap();
        other.import_backup(&path, "Importar backup").unwrap();
        assert_eq!(other.store().export_snapshot(), exported);
    }

    #[test]
    fn test_format_json_idempotent() {
        let once = format_json(r#"{"documents":[{"id":"a","tags":["x","y"]}]}"#).unwrap();
        assert!(once.contains("\n  \"documents\""));
        assert_eq!(format_json(&once).unwrap(), once);
        assert!(format_json("not json").is_err());
    }

    #[test]
    fn test_loads_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new().with_file(
            DATA_FILE,
            r#"{"documents": [{"id": "doc_9", "organism": "grouvex", "type": "bo", "title": "B.O. 9"}]}"#,
        );
        let session = session(dir.path(), backend);
        assert_eq!(session.store().documents().len(), 1);
        assert!(session.history_report().starts_with("HISTORIAL COMPLETO DE VERSIONES"));
    }
}
