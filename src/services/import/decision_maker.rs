//! Builds candidates for a batch of paths and runs every specification on each.

use super::ports::{MediaInfoReader, TitleCatalog};
use super::specifications::{ImportSpecification, SpecDecision};
use crate::services::fs_utils::DiskProvider;
use crate::services::parser::{parse_path, parse_release_name, ParsedReleaseInfo};
use crate::services::quality::{Quality, QualityModel};
use crate::types::{
    Candidate, DownloadHandle, ImportDecision, MediaInfo, Rejection, RejectionReason, Title,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared inputs for one batch of decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionRequest<'a> {
    /// Skips per-path title resolution when set.
    pub title: Option<&'a Title>,
    pub download: Option<&'a DownloadHandle>,
    /// Parsed name of the folder the paths came from.
    pub folder_info: Option<&'a ParsedReleaseInfo>,
    /// `false` for rescans of files already in the library.
    pub new_download: bool,
}

pub struct ImportDecisionMaker {
    specifications: Vec<Box<dyn ImportSpecification>>,
    disk: Arc<dyn DiskProvider>,
    catalog: Arc<dyn TitleCatalog>,
    media_info: Arc<dyn MediaInfoReader>,
}

impl ImportDecisionMaker {
    pub fn new(
        specifications: Vec<Box<dyn ImportSpecification>>,
        disk: Arc<dyn DiskProvider>,
        catalog: Arc<dyn TitleCatalog>,
        media_info: Arc<dyn MediaInfoReader>,
    ) -> Self {
        Self {
            specifications,
            disk,
            catalog,
            media_info,
        }
    }

    /// Exactly one decision per path, in input order.
    pub fn get_import_decisions(
        &self,
        paths: &[PathBuf],
        request: &DecisionRequest,
    ) -> Vec<ImportDecision> {
        let decisions: Vec<ImportDecision> =
            paths.iter().map(|path| self.decide(path, request)).collect();

        log::debug!(
            "{} of {} candidates approved",
            decisions.iter().filter(|d| d.approved()).count(),
            decisions.len()
        );
        decisions
    }

    fn decide(&self, path: &Path, request: &DecisionRequest) -> ImportDecision {
        let candidate = match self.build_candidate(path, request) {
            Ok(candidate) => candidate,
            Err(e) => {
                log::error!("Couldn't import file {}: {e:#}", path.display());
                let candidate = Candidate {
                    title: request.title.cloned(),
                    download: request.download.cloned(),
                    ..Candidate::for_path(path)
                };
                return ImportDecision::rejected(
                    candidate,
                    Rejection::new(
                        RejectionReason::ProcessingFailed,
                        format!("Unexpected error processing file: {e}"),
                    ),
                );
            }
        };

        if candidate.title.is_none() {
            log::warn!("Unable to resolve a game for {}", path.display());
            return ImportDecision::rejected(
                candidate,
                Rejection::new(RejectionReason::UnresolvedTitle, "Unknown Game"),
            );
        }

        let rejections = self.evaluate(&candidate, request.download);
        if !rejections.is_empty() {
            log::debug!(
                "{} rejected: {}",
                path.display(),
                rejections
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
        ImportDecision::new(candidate, rejections)
    }

    /// Every specification runs; a failing one becomes a rejection of its own.
    fn evaluate(
        &self,
        candidate: &Candidate,
        download: Option<&DownloadHandle>,
    ) -> Vec<Rejection> {
        self.specifications
            .iter()
            .filter_map(|spec| match spec.evaluate(candidate, download) {
                Ok(SpecDecision::Accept) => None,
                Ok(SpecDecision::Reject(rejection)) => Some(rejection),
                Err(e) => {
                    log::error!(
                        "{} check failed for {}: {e:#}",
                        spec.name(),
                        candidate.path.display()
                    );
                    Some(Rejection::new(
                        RejectionReason::SpecificationError,
                        format!("{}: {}", spec.name(), e),
                    ))
                }
            })
            .collect()
    }

    fn build_candidate(
        &self,
        path: &Path,
        request: &DecisionRequest,
    ) -> anyhow::Result<Candidate> {
        let is_folder = self.disk.folder_exists(path);
        let size = if is_folder {
            self.disk.get_folder_size(path)?
        } else {
            self.disk.get_file_size(path)?
        };

        let file_info = if is_folder { None } else { parse_path(path) };
        let folder_info = request.folder_info.cloned();
        let download_info = request
            .download
            .and_then(|d| parse_release_name(&d.title));

        let title = match request.title {
            Some(title) => Some(title.clone()),
            None => self.resolve_title(path, file_info.as_ref(), folder_info.as_ref())?,
        };

        let parsed = [&file_info, &folder_info, &download_info];
        let quality = parsed
            .iter()
            .filter_map(|info| info.as_ref().map(|i| i.quality))
            .find(|q| q.quality != Quality::Unknown)
            .unwrap_or_else(|| QualityModel::new(Quality::Unknown));
        let release_group = parsed
            .iter()
            .find_map(|info| info.as_ref().and_then(|i| i.release_group.clone()));

        let scene_name = request
            .download
            .map(|d| d.title.clone())
            .or_else(|| folder_info.as_ref().map(|i| i.release_title.clone()))
            .or_else(|| file_info.as_ref().map(|i| i.release_title.clone()));

        let format_score = match (&title, &scene_name) {
            (Some(title), Some(name)) => title.quality_profile.format_score(name),
            _ => 0,
        };
        let existing_file = title
            .as_ref()
            .map(|t| path.starts_with(&t.path))
            .unwrap_or(false);

        let media_info = if is_folder {
            None
        } else {
            Some(MediaInfo {
                runtime: self.media_info.read_runtime(path)?,
                audio_stream_count: self.media_info.read_audio_stream_count(path)?,
            })
        };

        Ok(Candidate {
            path: path.to_path_buf(),
            size,
            is_folder,
            title,
            quality,
            format_score,
            release_group,
            scene_name,
            file_info,
            folder_info,
            download: request.download.cloned(),
            existing_file,
            new_download: request.new_download,
            media_info,
        })
    }

    fn resolve_title(
        &self,
        path: &Path,
        file_info: Option<&ParsedReleaseInfo>,
        folder_info: Option<&ParsedReleaseInfo>,
    ) -> anyhow::Result<Option<Title>> {
        if let Some(title) = self.catalog.find_by_path(path)? {
            return Ok(Some(title));
        }
        for info in [folder_info, file_info].into_iter().flatten() {
            if let Some(title) = self.catalog.resolve_by_name(&info.title)? {
                return Ok(Some(title));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "tests/decision_maker_tests.rs"]
mod tests;
