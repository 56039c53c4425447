//! Collaborators the import engine consumes but does not own.
//!
//! Failures come back as `anyhow::Error`; the engine turns them into
//! per-candidate rejections or `ImportError::Collaborator`.

use crate::types::{Candidate, HistoryEvent, LibraryFile, Title, TitleId};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Catalog of wanted titles.
pub trait TitleCatalog: Send + Sync {
    /// Title whose library folder is, or contains, `path`.
    fn find_by_path(&self, path: &Path) -> anyhow::Result<Option<Title>>;
    fn resolve_by_name(&self, name: &str) -> anyhow::Result<Option<Title>>;
    /// Point the title at its new current file (or none).
    fn set_current_file(&self, title_id: TitleId, file: Option<LibraryFile>) -> anyhow::Result<()>;
}

pub trait HistoryProvider: Send + Sync {
    /// Events for a title, oldest first.
    fn events_for_title(&self, title_id: TitleId) -> anyhow::Result<Vec<HistoryEvent>>;
}

/// Naming templates for library files.
pub trait NamingBuilder: Send + Sync {
    fn build_file_name(&self, title: &Title, candidate: &Candidate) -> anyhow::Result<String>;
    fn build_file_path(
        &self,
        title: &Title,
        file_name: &str,
        extension: &str,
    ) -> anyhow::Result<PathBuf>;
}

/// Technical metadata probe (runtime, streams).
pub trait MediaInfoReader: Send + Sync {
    fn read_runtime(&self, path: &Path) -> anyhow::Result<Option<Duration>>;
    fn read_audio_stream_count(&self, path: &Path) -> anyhow::Result<Option<u32>>;
}

/// Index of files assigned to titles.
pub trait MediaFileIndex: Send + Sync {
    /// Store a new record and return it with its id assigned.
    fn add(&self, file: LibraryFile) -> anyhow::Result<LibraryFile>;
    fn delete(&self, file: &LibraryFile) -> anyhow::Result<()>;
    fn files_for_title(&self, title_id: TitleId) -> anyhow::Result<Vec<LibraryFile>>;
}
