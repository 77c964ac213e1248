//! Full backups: documents plus history in one bundle file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

use super::error::{BulletinError, Result, SyncError};
use super::ledger::VersionsFile;
use super::store::{Collection, DocumentStore, StoreSnapshot};

const BACKUP_PREFIX: &str = "ddoo_full_backup_";

/// On-disk backup bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupBundle {
    /// Unix seconds
    pub exported_at: i64,
    #[serde(default)]
    pub exported_by: Option<String>,
    pub data: Collection,
    pub versions: VersionsFile,
}

impl BackupBundle {
    pub fn from_store(store: &DocumentStore, exported_by: Option<&str>, exported_at: i64) -> Self {
        Self {
            exported_at,
            exported_by: exported_by.map(str::to_string),
            data: store.collection(),
            versions: store.ledger().to_file(),
        }
    }

    pub fn into_snapshot(self) -> StoreSnapshot {
        StoreSnapshot {
            documents: self.data.documents,
            versions: self.versions.versions,
        }
    }
}

/// `ddoo_full_backup_<millis>.json`
pub fn backup_file_name(millis: i64) -> String {
    format!("{}{}.json", BACKUP_PREFIX, millis)
}

pub fn write_backup(dir: &Path, bundle: &BackupBundle) -> Result<PathBuf, SyncError> {
    let path = dir.join(backup_file_name(chrono::Utc::now().timestamp_millis()));
    let content = serde_json::to_string_pretty(bundle).map_err(|source| SyncError::Encode {
        path: path.display().to_string(),
        source,
    })?;

    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, content))
        .map_err(|source| SyncError::Write {
            path: path.display().to_string(),
            source,
        })?;

    tracing::info!("Wrote backup {}", path.display());
    Ok(path)
}

/// Read a bundle, rejecting files without both `data` and `versions`
pub fn read_backup(path: &Path) -> Result<BackupBundle> {
    let text = std::fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_backup(&text)
}

pub fn parse_backup(text: &str) -> Result<BackupBundle> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BulletinError::validation(format!("backup is not valid JSON: {}", e)))?;

    if value.get("data").is_none() || value.get("versions").is_none() {
        return Err(BulletinError::validation("invalid backup file: missing data or versions"));
    }

    serde_json::from_value(value)
        .map_err(|e| BulletinError::validation(format!("invalid backup file: {}", e)))
}

/// Backup files directly inside `dir`, newest first
pub fn find_backups(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<(i64, PathBuf)> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?;
            let millis = name
                .strip_prefix(BACKUP_PREFIX)?
                .strip_suffix(".json")?
                .parse::<i64>()
                .ok()?;
            Some((millis, e.path().to_path_buf()))
        })
        .collect();

    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::DocumentDraft;

    fn store() -> DocumentStore {
        let mut store = DocumentStore::new(50);
        let draft = DocumentDraft {
            organism: "designs".into(),
            doc_type: "miembros".into(),
            title: "Miembros 2025".into(),
            ..Default::default()
        };
        store.create_archived(&draft, "Alta", "admin@grouvex.com").unwrap();
        store
    }

    #[test]
    fn test_bundle_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let bundle = BackupBundle::from_store(&store, Some("admin@grouvex.com"), 1741165623);

        let path = write_backup(dir.path(), &bundle).unwrap();
        let loaded = read_backup(&path).unwrap();
        assert_eq!(loaded, bundle);

        let mut restored = DocumentStore::new(50);
        restored.import_snapshot(loaded.into_snapshot());
        assert_eq!(restored.export_snapshot(), store.export_snapshot());
    }

    #[test]
    fn test_bundle_wire_shape() {
        let bundle = BackupBundle::from_store(&store(), None, 10);
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["exportedAt"], 10);
        assert!(value["data"]["documents"].is_array());
        assert!(value["versions"]["versions"].is_array());
    }

    #[test]
    fn test_parse_backup_rejects_partial_bundles() {
        assert!(matches!(
            parse_backup(r#"{"data": {"documents": []}}"#),
            Err(BulletinError::Validation(_))
        ));
        assert!(parse_backup("[]").is_err());
        assert!(parse_backup(r#"{"exportedAt": 1, "data": {"documents": []}, "versions": {"versions": []}}"#).is_ok());
    }

    #[test]
    fn test_find_backups_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            backup_file_name(100),
            backup_file_name(300),
            backup_file_name(200),
            "notes.json".to_string(),
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let found = find_backups(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![backup_file_name(300), backup_file_name(200), backup_file_name(100)]
        );
    }
}
