//! Transient import records: candidates, decisions and outcomes.

use super::library::{DownloadHandle, LibraryFile, MediaInfo, Title, TitleId};
use crate::services::parser::ParsedReleaseInfo;
use crate::services::quality::QualityModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A file or folder on disk being evaluated for import. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    /// The whole directory is the unit (installer/scene folder).
    pub is_folder: bool,
    pub title: Option<Title>,
    pub quality: QualityModel,
    pub format_score: i32,
    pub release_group: Option<String>,
    pub scene_name: Option<String>,
    pub file_info: Option<ParsedReleaseInfo>,
    pub folder_info: Option<ParsedReleaseInfo>,
    pub download: Option<DownloadHandle>,
    /// Already inside the title's library folder (rescan).
    pub existing_file: bool,
    pub new_download: bool,
    pub media_info: Option<MediaInfo>,
}

impl Candidate {
    /// Placeholder for a path that never became a full candidate.
    pub fn for_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> anyhow::Result<&Title> {
        self.title
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No title resolved for {}", self.path.display()))
    }

    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// The six outward failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionCategory {
    Unresolved,
    StructureRejected,
    Infected,
    Unapproved,
    NothingExtractable,
    IoFailure,
}

/// Enumerable reason code carried by every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    UnresolvedTitle,
    TitlePathIsSource,
    SuspiciousFiles,
    StructureMismatch,
    Infected,
    ScanIncomplete,
    ProcessingFailed,
    SpecificationError,
    MinimumFreeSpace,
    Sample,
    NoAudioTrack,
    GrabMismatch,
    AlreadyImported,
    NotUpgrade,
    UpgradesNotAllowed,
    AlreadyImportedInBatch,
    DangerousFile,
    UnextractedArchive,
    NoGameFiles,
    ImportFailed,
}

impl RejectionReason {
    const ALL: [RejectionReason; 20] = [
        RejectionReason::UnresolvedTitle,
        RejectionReason::TitlePathIsSource,
        RejectionReason::SuspiciousFiles,
        RejectionReason::StructureMismatch,
        RejectionReason::Infected,
        RejectionReason::ScanIncomplete,
        RejectionReason::ProcessingFailed,
        RejectionReason::SpecificationError,
        RejectionReason::MinimumFreeSpace,
        RejectionReason::Sample,
        RejectionReason::NoAudioTrack,
        RejectionReason::GrabMismatch,
        RejectionReason::AlreadyImported,
        RejectionReason::NotUpgrade,
        RejectionReason::UpgradesNotAllowed,
        RejectionReason::AlreadyImportedInBatch,
        RejectionReason::DangerousFile,
        RejectionReason::UnextractedArchive,
        RejectionReason::NoGameFiles,
        RejectionReason::ImportFailed,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::UnresolvedTitle => "unresolved_title",
            RejectionReason::TitlePathIsSource => "title_path_is_source",
            RejectionReason::SuspiciousFiles => "suspicious_files",
            RejectionReason::StructureMismatch => "structure_mismatch",
            RejectionReason::Infected => "infected",
            RejectionReason::ScanIncomplete => "scan_incomplete",
            RejectionReason::ProcessingFailed => "processing_failed",
            RejectionReason::SpecificationError => "specification_error",
            RejectionReason::MinimumFreeSpace => "minimum_free_space",
            RejectionReason::Sample => "sample",
            RejectionReason::NoAudioTrack => "no_audio_track",
            RejectionReason::GrabMismatch => "grab_mismatch",
            RejectionReason::AlreadyImported => "already_imported",
            RejectionReason::NotUpgrade => "not_upgrade",
            RejectionReason::UpgradesNotAllowed => "upgrades_not_allowed",
            RejectionReason::AlreadyImportedInBatch => "already_imported_in_batch",
            RejectionReason::DangerousFile => "dangerous_file",
            RejectionReason::UnextractedArchive => "unextracted_archive",
            RejectionReason::NoGameFiles => "no_game_files",
            RejectionReason::ImportFailed => "import_failed",
        }
    }

    pub fn category(&self) -> RejectionCategory {
        match self {
            RejectionReason::UnresolvedTitle => RejectionCategory::Unresolved,
            RejectionReason::SuspiciousFiles | RejectionReason::StructureMismatch => {
                RejectionCategory::StructureRejected
            }
            RejectionReason::Infected | RejectionReason::ScanIncomplete => {
                RejectionCategory::Infected
            }
            RejectionReason::DangerousFile
            | RejectionReason::UnextractedArchive
            | RejectionReason::NoGameFiles => RejectionCategory::NothingExtractable,
            RejectionReason::ImportFailed => RejectionCategory::IoFailure,
            RejectionReason::TitlePathIsSource
            | RejectionReason::ProcessingFailed
            | RejectionReason::SpecificationError
            | RejectionReason::MinimumFreeSpace
            | RejectionReason::Sample
            | RejectionReason::NoAudioTrack
            | RejectionReason::GrabMismatch
            | RejectionReason::AlreadyImported
            | RejectionReason::NotUpgrade
            | RejectionReason::UpgradesNotAllowed
            | RejectionReason::AlreadyImportedInBatch => RejectionCategory::Unapproved,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RejectionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| format!("Unknown rejection reason: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.reason, self.message)
    }
}

/// Verdict for one candidate. Approved iff no rejections.
#[derive(Debug, Clone)]
pub struct ImportDecision {
    pub candidate: Candidate,
    pub rejections: Vec<Rejection>,
}

impl ImportDecision {
    pub fn new(candidate: Candidate, rejections: Vec<Rejection>) -> Self {
        Self {
            candidate,
            rejections,
        }
    }

    pub fn rejected(candidate: Candidate, rejection: Rejection) -> Self {
        Self::new(candidate, vec![rejection])
    }

    pub fn approved(&self) -> bool {
        self.rejections.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportResultKind {
    Imported,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub decision: ImportDecision,
    pub kind: ImportResultKind,
    /// Every reason, in evaluation order. Empty when imported.
    pub rejections: Vec<Rejection>,
    pub imported_file: Option<LibraryFile>,
    /// Records replaced by this import (moved to the recycle bin).
    pub replaced_files: Vec<LibraryFile>,
}

impl ImportOutcome {
    pub fn imported(
        decision: ImportDecision,
        file: LibraryFile,
        replaced_files: Vec<LibraryFile>,
    ) -> Self {
        Self {
            decision,
            kind: ImportResultKind::Imported,
            rejections: Vec::new(),
            imported_file: Some(file),
            replaced_files,
        }
    }

    /// Rejected outcome carrying the decision's own reasons.
    pub fn from_rejected_decision(decision: ImportDecision) -> Self {
        let rejections = decision.rejections.clone();
        Self {
            decision,
            kind: ImportResultKind::Rejected,
            rejections,
            imported_file: None,
            replaced_files: Vec::new(),
        }
    }

    /// Rejected outcome with one more reason appended to the decision's.
    pub fn rejected(decision: ImportDecision, rejection: Rejection) -> Self {
        let mut outcome = Self::from_rejected_decision(decision);
        outcome.rejections.push(rejection);
        outcome
    }

    /// Rejection for a path that never produced a decision.
    pub fn rejected_path(path: &Path, title: Option<&Title>, rejection: Rejection) -> Self {
        let candidate = Candidate {
            title: title.cloned(),
            ..Candidate::for_path(path)
        };
        Self::from_rejected_decision(ImportDecision::rejected(candidate, rejection))
    }

    pub fn source_path(&self) -> &Path {
        &self.decision.candidate.path
    }

    pub fn title_id(&self) -> Option<TitleId> {
        self.decision.candidate.title.as_ref().map(|t| t.id)
    }

    pub fn is_imported(&self) -> bool {
        self.kind == ImportResultKind::Imported
    }

    pub fn has_reason(&self, reason: RejectionReason) -> bool {
        self.rejections.iter().any(|r| r.reason == reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_roundtrip() {
        for reason in RejectionReason::ALL {
            assert_eq!(reason.code().parse::<RejectionReason>().unwrap(), reason);
        }
        assert!("import failed".parse::<RejectionReason>().is_err());
    }

    #[test]
    fn test_reason_categories() {
        assert_eq!(
            RejectionReason::UnresolvedTitle.category(),
            RejectionCategory::Unresolved
        );
        assert_eq!(
            RejectionReason::StructureMismatch.category(),
            RejectionCategory::StructureRejected
        );
        assert_eq!(RejectionReason::Infected.category(), RejectionCategory::Infected);
        assert_eq!(RejectionReason::Sample.category(), RejectionCategory::Unapproved);
        assert_eq!(
            RejectionReason::UnextractedArchive.category(),
            RejectionCategory::NothingExtractable
        );
        assert_eq!(
            RejectionReason::ImportFailed.category(),
            RejectionCategory::IoFailure
        );
    }

    #[test]
    fn test_rejected_outcome_keeps_decision_reasons_first() {
        let decision = ImportDecision::rejected(
            Candidate::for_path(Path::new("/downloads/game.iso")),
            Rejection::new(RejectionReason::Sample, "Sample"),
        );
        let outcome = ImportOutcome::rejected(
            decision,
            Rejection::new(RejectionReason::DangerousFile, "Caution"),
        );
        assert!(!outcome.is_imported());
        assert_eq!(outcome.rejections.len(), 2);
        assert_eq!(outcome.rejections[0].reason, RejectionReason::Sample);
        assert!(outcome.has_reason(RejectionReason::DangerousFile));
        assert_eq!(outcome.source_path(), Path::new("/downloads/game.iso"));
        assert_eq!(outcome.title_id(), None);
    }
}
