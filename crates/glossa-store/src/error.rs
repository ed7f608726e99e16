use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing document exists but is not well-formed. The store never
    /// rewrites a corrupt file; the caller decides whether to abort or
    /// remove it and start over.
    #[error("backing document is corrupt: {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}
