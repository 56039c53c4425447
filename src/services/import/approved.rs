//! Carries approved decisions into the library, one import per title.

use super::ports::MediaFileIndex;
use crate::services::file_ops::FileOrganizer;
use crate::types::{
    Candidate, DownloadHandle, ImportDecision, ImportError, ImportOutcome, ImportResult,
    LibraryFile, Rejection, RejectionReason, Title, TitleId, TransferMode,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ImportApprovedTitles {
    organizer: FileOrganizer,
    index: Arc<dyn MediaFileIndex>,
}

impl ImportApprovedTitles {
    pub fn new(organizer: FileOrganizer, index: Arc<dyn MediaFileIndex>) -> Self {
        Self { organizer, index }
    }

    /// One outcome per decision. Rejected decisions come first, in input order,
    /// then the approved ones grouped by title, best first.
    pub fn import(
        &self,
        decisions: Vec<ImportDecision>,
        new_download: bool,
        download: Option<&DownloadHandle>,
        mode: TransferMode,
    ) -> ImportResult<Vec<ImportOutcome>> {
        let mut outcomes = Vec::with_capacity(decisions.len());
        let mut order: Vec<TitleId> = Vec::new();
        let mut by_title: HashMap<TitleId, Vec<ImportDecision>> = HashMap::new();

        for decision in decisions {
            let title_id = decision.candidate.title.as_ref().map(|t| t.id);
            match title_id {
                Some(id) if decision.approved() => {
                    if !by_title.contains_key(&id) {
                        order.push(id);
                    }
                    by_title.entry(id).or_default().push(decision);
                }
                _ => outcomes.push(ImportOutcome::from_rejected_decision(decision)),
            }
        }

        for id in order {
            let Some(mut group) = by_title.remove(&id) else {
                continue;
            };
            sort_best_first(&mut group);

            let mut imported = false;
            for decision in group {
                if imported {
                    outcomes.push(ImportOutcome::rejected(
                        decision,
                        Rejection::new(
                            RejectionReason::AlreadyImportedInBatch,
                            "Game has already been imported",
                        ),
                    ));
                    continue;
                }

                let outcome = self.import_one(decision, new_download, download, mode)?;
                imported = outcome.is_imported();
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }

    fn import_one(
        &self,
        decision: ImportDecision,
        new_download: bool,
        download: Option<&DownloadHandle>,
        mode: TransferMode,
    ) -> ImportResult<ImportOutcome> {
        let Some(title) = decision.candidate.title.clone() else {
            return Ok(ImportOutcome::from_rejected_decision(decision));
        };

        let result = if new_download {
            self.import_download(&decision.candidate, &title, mode)
        } else {
            self.organizer
                .record_in_place(&decision.candidate, &title)
                .map(|file| (file, Vec::new()))
        };

        match result {
            Ok((file, replaced)) => {
                log::info!(
                    "Imported {} for '{}'{}",
                    decision.candidate.path.display(),
                    title.name,
                    download
                        .map(|d| format!(" (download {})", d.download_id))
                        .unwrap_or_default()
                );
                Ok(ImportOutcome::imported(decision, file, replaced))
            }
            Err(e) if is_rejectable(&e) => {
                log::warn!(
                    "Couldn't import {} for '{}': {}",
                    decision.candidate.path.display(),
                    title.name,
                    e
                );
                Ok(ImportOutcome::rejected(
                    decision,
                    Rejection::new(
                        RejectionReason::ImportFailed,
                        format!("Failed to import game: {e}"),
                    ),
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn import_download(
        &self,
        candidate: &Candidate,
        title: &Title,
        mode: TransferMode,
    ) -> ImportResult<(LibraryFile, Vec<LibraryFile>)> {
        let mut existing = self.index.files_for_title(title.id)?;
        if existing.is_empty() {
            existing.extend(title.current_file.clone());
        }

        if existing.is_empty() {
            let file = self.organizer.place(candidate, title, mode)?;
            return Ok((file, Vec::new()));
        }

        let outcome = self.organizer.replace(&existing, candidate, title, mode)?;
        let replaced = outcome.old_files.into_iter().map(|r| r.file).collect();
        Ok((outcome.new_file, replaced))
    }
}

/// Failures that leave the disk as it was and only concern this candidate.
fn is_rejectable(error: &ImportError) -> bool {
    matches!(
        error,
        ImportError::DestinationExists(_)
            | ImportError::SameFilename(_)
            | ImportError::OutsideTitleFolder(_)
            | ImportError::RecycleBin(_)
    )
}

fn sort_best_first(group: &mut [ImportDecision]) {
    group.sort_by(|a, b| {
        let by_quality = match a.candidate.title.as_ref() {
            Some(title) => title
                .quality_profile
                .compare_models(&b.candidate.quality, &a.candidate.quality),
            None => Ordering::Equal,
        };
        by_quality.then_with(|| b.candidate.size.cmp(&a.candidate.size))
    });
}
