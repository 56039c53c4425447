//! Recycle bin for replaced library files.
//!
//! Items move to `{bin}/{uuid}/{name}` with a `metadata.json` next to them,
//! so a failed replacement can put them back.

use crate::services::fs_utils::file_utils;
use crate::types::errors::RecycleBinError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecycleEntry {
    pub id: String,
    pub original_path: PathBuf,
    pub original_name: String,
    pub recycled_at: DateTime<Utc>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct RecycleBin {
    dir: PathBuf,
}

impl RecycleBin {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move a file or folder into the bin.
    pub fn stage(&self, source_path: &Path) -> Result<RecycleEntry, RecycleBinError> {
        if !source_path.exists() {
            return Err(RecycleBinError::SourceMissing(source_path.to_path_buf()));
        }

        let original_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| RecycleBinError::SourceMissing(source_path.to_path_buf()))?;

        let id = Uuid::new_v4().to_string();
        let entry_dir = self.dir.join(&id);
        fs::create_dir_all(&entry_dir)?;

        let entry = RecycleEntry {
            id: id.clone(),
            original_path: source_path.to_path_buf(),
            original_name: original_name.clone(),
            recycled_at: Utc::now(),
            size_bytes: file_utils::path_size(source_path).unwrap_or(0),
        };

        fs::write(
            entry_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&entry)?,
        )?;

        if let Err(e) = file_utils::rename_cross_drive_fallback(
            source_path,
            &entry_dir.join(&original_name),
        ) {
            let _ = fs::remove_dir_all(&entry_dir);
            return Err(e.into());
        }

        log::info!(
            "Moved '{}' to recycle bin (id: {})",
            source_path.display(),
            id
        );
        Ok(entry)
    }

    /// Put an entry back where it came from and drop it from the bin.
    pub fn restore(&self, id: &str) -> Result<PathBuf, RecycleBinError> {
        let entry_dir = self.dir.join(id);
        let entry = read_entry(&entry_dir)?;

        if entry.original_path.exists() {
            return Err(RecycleBinError::OriginalExists(entry.original_path));
        }

        let content = entry_dir.join(&entry.original_name);
        if !content.exists() {
            return Err(RecycleBinError::EntryNotFound(id.to_string()));
        }

        if let Some(parent) = entry.original_path.parent() {
            fs::create_dir_all(parent)?;
        }
        file_utils::rename_cross_drive_fallback(&content, &entry.original_path)?;
        fs::remove_dir_all(&entry_dir)?;

        log::info!("Restored '{}' from recycle bin", entry.original_path.display());
        Ok(entry.original_path)
    }

    /// All entries, newest first. Entries with unreadable metadata are skipped.
    pub fn list(&self) -> Result<Vec<RecycleEntry>, RecycleBinError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut items: Vec<RecycleEntry> = fs::read_dir(&self.dir)?
            .flatten()
            .filter_map(|e| match read_entry(&e.path()) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::debug!("Skipping {}: {}", e.path().display(), err);
                    None
                }
            })
            .collect();

        items.sort_by(|a, b| b.recycled_at.cmp(&a.recycled_at));
        Ok(items)
    }

    /// Permanently delete every entry. Returns how many were removed.
    pub fn empty(&self) -> Result<u64, RecycleBinError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut count = 0u64;
        for entry in fs::read_dir(&self.dir)?.flatten() {
            if entry.path().is_dir() {
                fs::remove_dir_all(entry.path())?;
                count += 1;
            }
        }

        log::info!("Emptied recycle bin: {} entries removed", count);
        Ok(count)
    }
}

fn read_entry(entry_dir: &Path) -> Result<RecycleEntry, RecycleBinError> {
    let metadata_path = entry_dir.join(METADATA_FILE);
    if !metadata_path.exists() {
        let id = entry_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        return Err(RecycleBinError::EntryNotFound(id));
    }
    let raw = fs::read_to_string(metadata_path)?;
    Ok(serde_json::from_str(&raw)?)
}
