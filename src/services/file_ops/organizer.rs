//! Places approved candidates into the library and records them.

use super::recycle_bin::{RecycleBin, RecycleEntry};
use crate::services::fs_utils::path_utils::relative_within;
use crate::services::fs_utils::DiskProvider;
use crate::services::import::ports::{MediaFileIndex, NamingBuilder, TitleCatalog};
use crate::types::{Candidate, ImportError, ImportResult, LibraryFile, Title, TransferMode};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_RECYCLE_DIR: &str = ".recycle";

#[derive(Debug, Clone)]
pub struct ReplacedFile {
    pub file: LibraryFile,
    /// `None` when the record pointed at nothing on disk.
    pub recycled: Option<RecycleEntry>,
}

#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    pub new_file: LibraryFile,
    pub old_files: Vec<ReplacedFile>,
}

pub struct FileOrganizer {
    disk: Arc<dyn DiskProvider>,
    naming: Arc<dyn NamingBuilder>,
    index: Arc<dyn MediaFileIndex>,
    catalog: Arc<dyn TitleCatalog>,
    recycle_bin: Option<PathBuf>,
}

impl FileOrganizer {
    pub fn new(
        disk: Arc<dyn DiskProvider>,
        naming: Arc<dyn NamingBuilder>,
        index: Arc<dyn MediaFileIndex>,
        catalog: Arc<dyn TitleCatalog>,
        recycle_bin: Option<PathBuf>,
    ) -> Self {
        Self {
            disk,
            naming,
            index,
            catalog,
            recycle_bin,
        }
    }

    /// Configured bin, else `.recycle` next to the title folder.
    pub fn recycle_bin_for(&self, title: &Title) -> RecycleBin {
        let dir = match (&self.recycle_bin, title.root_folder()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(root)) => root.join(DEFAULT_RECYCLE_DIR),
            (None, None) => std::env::temp_dir().join("gamarr").join(DEFAULT_RECYCLE_DIR),
        };
        RecycleBin::new(dir)
    }

    /// Library destination and title-relative path for a candidate.
    pub fn destination_for(
        &self,
        candidate: &Candidate,
        title: &Title,
    ) -> ImportResult<(PathBuf, String)> {
        if candidate.is_folder {
            return Ok((title.path.clone(), String::new()));
        }

        let file_name = self.naming.build_file_name(title, candidate)?;
        let destination = self
            .naming
            .build_file_path(title, &file_name, &candidate.extension())?;

        match relative_within(&title.path, &destination) {
            Some(relative) if !relative.is_empty() => Ok((destination, relative)),
            _ => Err(ImportError::OutsideTitleFolder(destination)),
        }
    }

    /// Move or copy a candidate into its title folder and record it.
    pub fn place(
        &self,
        candidate: &Candidate,
        title: &Title,
        mode: TransferMode,
    ) -> ImportResult<LibraryFile> {
        let source = &candidate.path;
        if !self.disk.file_exists(source) && !self.disk.folder_exists(source) {
            return Err(ImportError::SourceMissing(source.clone()));
        }

        let (destination, relative_path) = self.destination_for(candidate, title)?;
        if destination == *source {
            return Err(ImportError::SameFilename(destination));
        }

        if let Some(parent) = destination.parent() {
            self.disk.create_folder(parent)?;
        }
        self.clear_destination(&destination, candidate.is_folder)?;

        match mode {
            TransferMode::Move => self.disk.move_path(source, &destination)?,
            TransferMode::Copy => self.disk.copy_path(source, &destination)?,
        }
        log::info!(
            "{:?} {} -> {}",
            mode,
            source.display(),
            destination.display()
        );

        self.record(candidate, title, relative_path).inspect_err(|_| {
            self.undo_transfer(source, &destination, mode);
        })
    }

    /// Put the library back the way it was before a transfer whose record failed.
    fn undo_transfer(&self, source: &Path, destination: &Path, mode: TransferMode) {
        let undone = match mode {
            TransferMode::Move => self.disk.move_path(destination, source),
            TransferMode::Copy if self.disk.folder_exists(destination) => {
                self.disk.delete_folder(destination, true)
            }
            TransferMode::Copy => self.disk.delete_file(destination),
        };
        if let Err(e) = undone {
            log::error!(
                "Failed to undo transfer of {} to {}: {}",
                source.display(),
                destination.display(),
                e
            );
        }
    }

    /// An empty title folder may be taken over by a folder release. Anything else blocks.
    fn clear_destination(&self, destination: &Path, is_folder: bool) -> ImportResult<()> {
        if self.disk.file_exists(destination) {
            return Err(ImportError::DestinationExists(destination.to_path_buf()));
        }
        if !self.disk.folder_exists(destination) {
            return Ok(());
        }
        if is_folder
            && self.disk.get_files(destination, true)?.is_empty()
            && self.disk.get_directories(destination)?.is_empty()
        {
            self.disk.delete_folder(destination, true)?;
            return Ok(());
        }
        Err(ImportError::DestinationExists(destination.to_path_buf()))
    }

    /// Record a candidate that already lives inside its title folder.
    pub fn record_in_place(
        &self,
        candidate: &Candidate,
        title: &Title,
    ) -> ImportResult<LibraryFile> {
        let relative_path = relative_within(&title.path, &candidate.path)
            .ok_or_else(|| ImportError::OutsideTitleFolder(candidate.path.clone()))?;

        for existing in self.index.files_for_title(title.id)? {
            if existing.relative_path == relative_path {
                self.index.delete(&existing)?;
            }
        }

        self.record(candidate, title, relative_path)
    }

    fn record(
        &self,
        candidate: &Candidate,
        title: &Title,
        relative_path: String,
    ) -> ImportResult<LibraryFile> {
        let file = LibraryFile {
            id: 0,
            title_id: title.id,
            relative_path,
            quality: candidate.quality,
            format_score: candidate.format_score,
            release_group: candidate.release_group.clone(),
            scene_name: candidate.scene_name.clone(),
            size: candidate.size,
            media_info: candidate.media_info.clone(),
            date_added: Utc::now(),
            original_file_path: Some(candidate.path.to_string_lossy().to_string()),
        };

        let stored = self.index.add(file)?;
        self.catalog.set_current_file(title.id, Some(stored.clone()))?;
        Ok(stored)
    }

    /// Swap the title's current files for the candidate. Old files go to the
    /// recycle bin first and come back if placing the new one fails.
    pub fn replace(
        &self,
        old_files: &[LibraryFile],
        candidate: &Candidate,
        title: &Title,
        mode: TransferMode,
    ) -> ImportResult<ReplaceOutcome> {
        let bin = self.recycle_bin_for(title);
        let mut staged: Vec<ReplacedFile> = Vec::with_capacity(old_files.len());
        let mut unrecorded: Vec<LibraryFile> = Vec::new();

        for old in old_files {
            let path = old.absolute_path(title);
            let recycled = if self.disk.file_exists(&path) || self.disk.folder_exists(&path) {
                match bin.stage(&path) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        self.roll_back(&bin, title, &staged, &unrecorded);
                        return Err(e.into());
                    }
                }
            } else {
                log::warn!("Replaced file missing on disk: {}", path.display());
                None
            };
            staged.push(ReplacedFile {
                file: old.clone(),
                recycled,
            });
        }

        for replaced in &staged {
            if let Err(e) = self.index.delete(&replaced.file) {
                self.roll_back(&bin, title, &staged, &unrecorded);
                return Err(e.into());
            }
            unrecorded.push(replaced.file.clone());
        }

        match self.place(candidate, title, mode) {
            Ok(new_file) => Ok(ReplaceOutcome {
                new_file,
                old_files: staged,
            }),
            Err(e) => {
                log::error!(
                    "Failed to place {} for '{}', restoring previous files: {}",
                    candidate.path.display(),
                    title.name,
                    e
                );
                self.roll_back(&bin, title, &staged, &unrecorded);
                Err(e)
            }
        }
    }

    fn roll_back(
        &self,
        bin: &RecycleBin,
        title: &Title,
        staged: &[ReplacedFile],
        unrecorded: &[LibraryFile],
    ) {
        for entry in staged.iter().filter_map(|r| r.recycled.as_ref()) {
            if let Err(e) = bin.restore(&entry.id) {
                log::error!(
                    "Failed to restore {} from recycle bin: {}",
                    entry.original_path.display(),
                    e
                );
            }
        }

        for file in unrecorded {
            if let Err(e) = self.index.add(file.clone()) {
                log::error!("Failed to re-add file record {}: {e:#}", file.relative_path);
            }
        }

        if let Err(e) = self
            .catalog
            .set_current_file(title.id, title.current_file.clone())
        {
            log::error!("Failed to reset current file for '{}': {e:#}", title.name);
        }
    }
}
