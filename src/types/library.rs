//! Library-side records: titles, their files, history and download handles.

use crate::services::quality::{QualityModel, QualityProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub type TitleId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MinimumAvailability {
    Announced,
    EarlyAccess,
    #[default]
    Released,
}

/// A game the library manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: Option<u32>,
    /// Library folder for this title: `<root folder>/<title folder>`.
    pub path: PathBuf,
    pub quality_profile: QualityProfile,
    pub minimum_availability: MinimumAvailability,
    pub monitored: bool,
    /// Expected runtime of video content, used for sample detection. 0 when unknown.
    pub runtime_minutes: u32,
    pub current_file: Option<LibraryFile>,
}

impl Title {
    pub fn root_folder(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn has_file(&self) -> bool {
        self.current_file.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub runtime: Option<Duration>,
    pub audio_stream_count: Option<u32>,
}

/// File or whole folder assigned to a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryFile {
    pub id: i64,
    pub title_id: TitleId,
    /// Relative to the title folder. Empty when the record is the whole folder.
    pub relative_path: String,
    pub quality: QualityModel,
    /// Score under the profile at import time.
    pub format_score: i32,
    pub release_group: Option<String>,
    pub scene_name: Option<String>,
    pub size: u64,
    pub media_info: Option<MediaInfo>,
    pub date_added: DateTime<Utc>,
    pub original_file_path: Option<String>,
}

impl LibraryFile {
    pub fn is_folder(&self) -> bool {
        self.relative_path.is_empty()
    }

    pub fn absolute_path(&self, title: &Title) -> PathBuf {
        if self.is_folder() {
            title.path.clone()
        } else {
            title.path.join(&self.relative_path)
        }
    }

    /// Score under `profile` as it is configured now, not at import time.
    pub fn current_format_score(&self, profile: &QualityProfile) -> i32 {
        let name = self
            .scene_name
            .as_deref()
            .unwrap_or(self.relative_path.as_str());
        profile.format_score(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEventKind {
    Grabbed,
    Imported,
}

impl fmt::Display for HistoryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEventKind::Grabbed => write!(f, "Grabbed"),
            HistoryEventKind::Imported => write!(f, "Imported"),
        }
    }
}

impl FromStr for HistoryEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grabbed" => Ok(HistoryEventKind::Grabbed),
            "imported" | "downloadfolderimported" => Ok(HistoryEventKind::Imported),
            _ => Err(format!("Unknown history event: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub title_id: TitleId,
    pub kind: HistoryEventKind,
    pub date: DateTime<Utc>,
    pub quality: QualityModel,
    pub download_id: Option<String>,
    /// Release name the event refers to.
    pub source_title: String,
}

/// Download client item the content came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadHandle {
    pub download_id: String,
    pub title: String,
    pub output_path: Option<PathBuf>,
    pub can_move_files: bool,
}

/// Import mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImportMode {
    #[default]
    Auto,
    Move,
    Copy,
}

/// Concrete transfer after resolving `ImportMode::Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferMode {
    Move,
    Copy,
}

impl ImportMode {
    /// `Auto` copies only when the download client says its files must stay put.
    pub fn resolve(self, download: Option<&DownloadHandle>) -> TransferMode {
        match self {
            ImportMode::Move => TransferMode::Move,
            ImportMode::Copy => TransferMode::Copy,
            ImportMode::Auto => match download {
                Some(handle) if !handle.can_move_files => TransferMode::Copy,
                _ => TransferMode::Move,
            },
        }
    }
}
