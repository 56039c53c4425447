use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that surface as `Err` from the engine instead of a rejected outcome.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Source missing: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    #[error("Source and destination are the same: {}", .0.display())]
    SameFilename(PathBuf),
    #[error("Path is outside the title folder: {}", .0.display())]
    OutsideTitleFolder(PathBuf),
    #[error("Recycle bin error: {0}")]
    RecycleBin(#[from] RecycleBinError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
    #[error("Config error: {0}")]
    Config(String),
}

impl Serialize for ImportError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum RecycleBinError {
    #[error("Source does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Recycle bin entry not found: {0}")]
    EntryNotFound(String),
    #[error("Original path already exists: {}", .0.display())]
    OriginalExists(PathBuf),
    #[error("Invalid recycle bin metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
