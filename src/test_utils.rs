use crate::services::quality::{Quality, QualityModel, QualityProfile};
use crate::types::{
    Candidate, HistoryEvent, HistoryEventKind, LibraryFile, MinimumAvailability, Title, TitleId,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn title_at(path: &Path) -> Title {
    Title {
        id: 1,
        name: "Some Game".into(),
        year: Some(2020),
        path: path.to_path_buf(),
        quality_profile: QualityProfile::default(),
        minimum_availability: MinimumAvailability::Released,
        monitored: true,
        runtime_minutes: 0,
        current_file: None,
    }
}

pub fn library_file(title_id: TitleId, relative_path: &str, quality: Quality) -> LibraryFile {
    LibraryFile {
        id: 10,
        title_id,
        relative_path: relative_path.into(),
        quality: QualityModel::new(quality),
        format_score: 0,
        release_group: None,
        scene_name: None,
        size: 1024,
        media_info: None,
        date_added: Utc::now(),
        original_file_path: None,
    }
}

/// Candidate for `path` resolved to `title`, as a new download.
pub fn candidate(title: &Title, path: &str, quality: Quality) -> Candidate {
    Candidate {
        path: PathBuf::from(path),
        size: 1024,
        title: Some(title.clone()),
        quality: QualityModel::new(quality),
        new_download: true,
        ..Candidate::default()
    }
}

pub fn history_event(
    title_id: TitleId,
    kind: HistoryEventKind,
    date: DateTime<Utc>,
    download_id: Option<&str>,
    source_title: &str,
) -> HistoryEvent {
    HistoryEvent {
        title_id,
        kind,
        date,
        quality: QualityModel::new(Quality::Scene),
        download_id: download_id.map(str::to_string),
        source_title: source_title.into(),
    }
}
