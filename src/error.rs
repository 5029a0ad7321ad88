//! Error types for content loading, progress persistence and import.

use std::path::PathBuf;

use thiserror::Error;

/// Startup content failure. Any one collection failing aborts the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document could not be fetched from its source.
    #[error("failed to read {collection} content")]
    Fetch {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The document was fetched but is not valid for its collection.
    #[error("failed to parse {collection} content")]
    Parse {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but a record breaks a structural rule.
    #[error("invalid {collection} record {id}: {reason}")]
    Invalid {
        collection: &'static str,
        id: String,
        reason: String,
    },
}

/// Rejected progress import. The existing progress is never touched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import file is not valid JSON")]
    Malformed(#[from] serde_json::Error),

    #[error("import file must contain a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("failed to read import file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Storage backend failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to {operation} storage file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode storage contents")]
    Encode(#[source] serde_json::Error),
}

/// Any failure surfaced by [`crate::app::App`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ImportError {
    /// Short message suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Malformed(_) | Self::NotAnObject { .. } => "Invalid JSON file.".to_string(),
            Self::Read { path, .. } => format!("Could not read {}", path.display()),
            Self::Storage(_) => "Progress could not be saved.".to_string(),
        }
    }
}
