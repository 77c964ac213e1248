//! Error types shared by the store, ledger and sync layers

use thiserror::Error;

/// Errors surfaced by document and ledger operations
#[derive(Debug, Error)]
pub enum BulletinError {
    /// A required field is missing or a structured field is not valid JSON
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation on an unknown document or version
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting user is not on the allow-list
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl BulletinError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn document_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "document",
            id: id.to_string(),
        }
    }

    pub(crate) fn version_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "version",
            id: id.to_string(),
        }
    }
}

/// Failures talking to a sync backend. Never retried automatically.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend rejected {path}: {message}")]
    Rejected { path: String, message: String },
}

pub type Result<T, E = BulletinError> = std::result::Result<T, E>;
