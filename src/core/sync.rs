//! Sync backends and the two-step publish of `data.json` and `versions.json`
//!
//! Publishing writes the collection first and the ledger second. The two
//! writes are not atomic: when the first lands and the second fails the
//! remote is left with new documents and stale history. That window is
//! reported in [`PublishOutcome::ManualSave`] and logged; nothing is rolled
//! back. Any failure falls back to writing both files to a local directory
//! for manual upload.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::error::SyncError;
use super::ledger::{VersionLedger, VersionsFile};
use super::store::{Collection, DocumentStore};
use super::time;

pub const DATA_FILE: &str = "data.json";
pub const VERSIONS_FILE: &str = "versions.json";

/// A place the collection is published to
pub trait SyncBackend {
    /// Short name for log lines
    fn name(&self) -> &str;

    /// Read a file; `Ok(None)` when it does not exist yet
    fn read(&self, path: &str) -> Result<Option<String>, SyncError>;

    /// Create or overwrite a file, with a commit-style message
    fn write(&mut self, path: &str, content: &str, message: &str) -> Result<(), SyncError>;
}

/// Backend over a plain directory, e.g. a checkout of the published site
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SyncBackend for DirectoryBackend {
    fn name(&self) -> &str {
        "directory"
    }

    fn read(&self, path: &str) -> Result<Option<String>, SyncError> {
        let full = self.root.join(path);
        match std::fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SyncError::Read {
                path: full.display().to_string(),
                source,
            }),
        }
    }

    fn write(&mut self, path: &str, content: &str, message: &str) -> Result<(), SyncError> {
        let full = self.root.join(path);
        write_file(&full, content)?;
        tracing::info!("Wrote {}: {}", full.display(), message);
        Ok(())
    }
}

/// Backend that keeps files in memory. Writes to paths marked failing are rejected.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    files: HashMap<String, String>,
    commits: Vec<(String, String)>,
    failing: HashSet<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: impl Into<String>) -> Self {
        self.files.insert(path.to_string(), content.into());
        self
    }

    /// Make every later write to `path` fail
    pub fn fail_writes_to(&mut self, path: &str) {
        self.failing.insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// `(path, message)` of every accepted write, oldest first
    pub fn commits(&self) -> &[(String, String)] {
        &self.commits
    }
}

impl SyncBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, path: &str) -> Result<Option<String>, SyncError> {
        Ok(self.files.get(path).cloned())
    }

    fn write(&mut self, path: &str, content: &str, message: &str) -> Result<(), SyncError> {
        if self.failing.contains(path) {
            return Err(SyncError::Rejected {
                path: path.to_string(),
                message: "write refused".to_string(),
            });
        }
        self.files.insert(path.to_string(), content.to_string());
        self.commits.push((path.to_string(), message.to_string()));
        Ok(())
    }
}

/// Load the store from a backend.
///
/// A missing `data.json` yields an empty collection. An unreadable
/// `versions.json` is logged and the ledger is marked unreadable, so later
/// publishes leave the stored history alone.
pub fn load_store(backend: &dyn SyncBackend, ledger_capacity: usize) -> Result<DocumentStore, SyncError> {
    let data: Collection = match backend.read(DATA_FILE)? {
        Some(text) => serde_json::from_str(&text).map_err(|source| SyncError::Decode {
            path: DATA_FILE.to_string(),
            source,
        })?,
        None => Collection::default(),
    };

    let ledger = match backend.read(VERSIONS_FILE) {
        Ok(Some(text)) => match serde_json::from_str::<VersionsFile>(&text) {
            Ok(file) => VersionLedger::from_file(file, ledger_capacity),
            Err(e) => {
                tracing::warn!("Unreadable {}, history will not be published: {}", VERSIONS_FILE, e);
                VersionLedger::unreadable(ledger_capacity)
            }
        },
        Ok(None) => VersionLedger::new(ledger_capacity),
        Err(e) => {
            tracing::warn!("Could not load {}, history will not be published: {}", VERSIONS_FILE, e);
            VersionLedger::unreadable(ledger_capacity)
        }
    };

    tracing::info!(
        "Loaded {} documents and {} versions from {}",
        data.documents.len(),
        ledger.len(),
        backend.name()
    );
    Ok(DocumentStore::with_ledger(data, ledger))
}

/// What kind of save is being published; selects the commit prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Save,
    Delete,
}

/// Result of a publish that did not hard-fail
#[derive(Debug)]
pub enum PublishOutcome {
    /// Both files reached the backend
    Synced,
    /// `data.json` reached the backend; `versions.json` was left as it was
    /// because it could not be loaded
    HistoryKept,
    /// The backend failed; both files were written to the fallback directory
    ManualSave {
        reason: SyncError,
        /// `data.json` reached the backend but `versions.json` did not
        inconsistent: bool,
        files: Vec<PathBuf>,
    },
}

/// Commit messages for one publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessages {
    pub data: String,
    pub versions: String,
}

impl CommitMessages {
    pub fn new(kind: CommitKind, changes: &str, author: &str, timestamp: i64) -> Self {
        let stamp = time::commit_stamp(timestamp);
        let prefix = match kind {
            CommitKind::Save => "📝",
            CommitKind::Delete => "🗑️",
        };
        let author = if author.is_empty() { "Admin" } else { author };

        Self {
            data: format!("{} {} [{}] - {}", prefix, changes, stamp, author),
            versions: format!("📚 Historial: {} [{}]", changes, stamp),
        }
    }
}

/// Serialize the store into the two published files
pub fn render_files(store: &DocumentStore) -> Result<(String, String), SyncError> {
    let data = serde_json::to_string_pretty(&store.collection()).map_err(|source| SyncError::Encode {
        path: DATA_FILE.to_string(),
        source,
    })?;
    let versions = serde_json::to_string_pretty(&store.ledger().to_file()).map_err(|source| {
        SyncError::Encode {
            path: VERSIONS_FILE.to_string(),
            source,
        }
    })?;
    Ok((data, versions))
}

/// Publish the store: `data.json`, then `versions.json`, falling back to a manual save
pub fn publish(
    store: &DocumentStore,
    backend: &mut dyn SyncBackend,
    fallback_dir: &Path,
    messages: &CommitMessages,
) -> Result<PublishOutcome, SyncError> {
    let (data, versions) = render_files(store)?;
    let keep_history = store.ledger().is_unreadable();

    let failure = match backend.write(DATA_FILE, &data, &messages.data) {
        Err(e) => Some((e, false)),
        Ok(()) if keep_history => None,
        Ok(()) => match backend.write(VERSIONS_FILE, &versions, &messages.versions) {
            Ok(()) => None,
            Err(e) => Some((e, true)),
        },
    };

    let Some((reason, inconsistent)) = failure else {
        if keep_history {
            tracing::warn!(
                "Published {} to {}; {} left untouched",
                DATA_FILE,
                backend.name(),
                VERSIONS_FILE
            );
            return Ok(PublishOutcome::HistoryKept);
        }
        tracing::info!("Published to {}", backend.name());
        return Ok(PublishOutcome::Synced);
    };

    if inconsistent {
        tracing::warn!(
            "{} published but {} failed on {}; remote history is stale",
            DATA_FILE,
            VERSIONS_FILE,
            backend.name()
        );
    }
    tracing::warn!("Publish failed ({}), saving to {}", reason, fallback_dir.display());

    let versions = (!keep_history).then_some(versions.as_str());
    let files = manual_save(fallback_dir, &data, versions)?;
    Ok(PublishOutcome::ManualSave {
        reason,
        inconsistent,
        files,
    })
}

/// Write the files to a local directory for manual upload
pub fn manual_save(dir: &Path, data: &str, versions: Option<&str>) -> Result<Vec<PathBuf>, SyncError> {
    let data_path = dir.join(DATA_FILE);
    write_file(&data_path, data)?;
    let mut files = vec![data_path];

    if let Some(versions) = versions {
        let versions_path = dir.join(VERSIONS_FILE);
        write_file(&versions_path, versions)?;
        files.push(versions_path);
    }
    Ok(files)
}

fn write_file(path: &Path, content: &str) -> Result<(), SyncError> {
    let result = match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).and_then(|_| std::fs::write(path, content)),
        None => std::fs::write(path, content),
    };
    result.map_err(|source| SyncError::Write {
        path: path.display().to_string(),
        source,
    })
}
