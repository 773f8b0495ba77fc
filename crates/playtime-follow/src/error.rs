use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FollowError {
    #[error("Cannot open log file {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FollowError {
    /// Whether the error ends following for good.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FollowError::SourceUnavailable { .. })
    }
}
