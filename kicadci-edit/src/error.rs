//! Error types for kicadci-edit.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failure to rewrite a board file on disk.
#[derive(Debug, Error)]
pub enum EditError {
    /// The board file is missing or unreadable.
    #[error("read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rewritten board file could not be stored.
    #[error("write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            EditError::Read { path, .. } | EditError::Write { path, .. } => path,
        }
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
