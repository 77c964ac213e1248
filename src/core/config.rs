//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::ledger::VersionLedger;
use super::sync::{DirectoryBackend, MemoryBackend, SyncBackend};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Working directory holding `data.json` and `versions.json`
    pub data_dir: Option<PathBuf>,
    /// Where documents are published
    pub backend: BackendConfig,
    /// Manual-save target when publishing fails
    pub fallback_dir: Option<PathBuf>,
    /// Where full backups are written and looked up
    pub backup_dir: Option<PathBuf>,
    /// Maximum number of version records kept
    pub ledger_capacity: usize,
    /// Admin allow-list
    pub auth: AuthConfig,
}

/// Publish target selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    /// A directory; defaults to the data directory
    Directory {
        #[serde(default)]
        root: Option<PathBuf>,
    },
    /// Nothing is persisted
    Memory,
}

/// Who may edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub authorized_emails: Vec<String>,
    /// Any address under one of these domains is allowed
    pub authorized_domains: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendConfig::default(),
            fallback_dir: None,
            backup_dir: None,
            ledger_capacity: VersionLedger::DEFAULT_CAPACITY,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Directory { root: None }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorized_emails: [
                "admin@grouvex.com",
                "legal@grouvex.com",
                "grouvex.phoenix@grouvex.com",
                "director@grouvex.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            authorized_domains: Vec::new(),
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "grouvex", "Bulletin")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a file, defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save config: {}", path.display()))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn fallback_dir(&self) -> PathBuf {
        self.fallback_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("manual"))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("backups"))
    }

    /// Instantiate the configured backend
    pub fn open_backend(&self) -> Box<dyn SyncBackend> {
        match &self.backend {
            BackendConfig::Directory { root } => {
                let root = root.clone().unwrap_or_else(|| self.data_dir());
                Box::new(DirectoryBackend::new(root))
            }
            BackendConfig::Memory => Box::new(MemoryBackend::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.ledger_capacity, 50);
        assert_eq!(config.backend, BackendConfig::Directory { root: None });
        assert!(config.auth.authorized_emails.contains(&"admin@grouvex.com".to_string()));
    }

    #[test]
    fn test_partial_file_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"data_dir": "/srv/boletin", "ledger_capacity": 20, "backend": {"kind": "memory"}}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.ledger_capacity, 20);
        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.fallback_dir(), PathBuf::from("/srv/boletin/manual"));
        assert_eq!(config.backup_dir(), PathBuf::from("/srv/boletin/backups"));
        assert_eq!(config.open_backend().name(), "memory");

        config.save_to(&path).unwrap();
        let again = AppConfig::load_from(&path).unwrap();
        assert_eq!(again.data_dir, config.data_dir);
        assert_eq!(again.backend, config.backend);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_save_reports_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = AppConfig::default()
            .save_to(&blocker.join("config.json"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to create config directory"));
    }
}
