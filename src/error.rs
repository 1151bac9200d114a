use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce the question list for a session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read question asset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("question asset is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bundled question asset is invalid: {0}")]
    Bundled(String),
    #[error("question loader task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("shortcut is empty")]
    Empty,
    #[error("unknown modifier {0:?} in shortcut")]
    UnknownModifier(String),
    #[error("shortcut key {0:?} must be a single character")]
    InvalidKey(String),
    #[error("shortcut needs Ctrl or Command")]
    MissingPrimary,
}
