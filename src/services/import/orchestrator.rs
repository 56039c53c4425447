//! Entry point for completed downloads: resolve a title, vet the content,
//! decide and import, then tidy up the download folder.

use super::approved::ImportApprovedTitles;
use super::decision_maker::{DecisionRequest, ImportDecisionMaker};
use super::ports::{HistoryProvider, MediaFileIndex, MediaInfoReader, NamingBuilder, TitleCatalog};
use super::specifications::default_specifications;
use crate::services::config::ImportSettings;
use crate::services::file_ops::FileOrganizer;
use crate::services::fs_utils::DiskProvider;
use crate::services::parser::{parse_release_name, strip_download_markers, ParsedReleaseInfo};
use crate::services::release::{ReleaseStructureValidator, StructureConfidence};
use crate::services::sample::{SampleClassification, SampleDetector};
use crate::services::scanner::walker::{self, FolderLayout};
use crate::services::virus_scan::{quarantine, VirusScanner};
use crate::types::{
    DownloadHandle, ImportMode, ImportOutcome, ImportResult, Rejection, RejectionReason, Title,
    TransferMode,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const QUARANTINE_DIR: &str = ".quarantine";

/// Collaborators the import service is wired with.
#[derive(Clone)]
pub struct ImportServices {
    pub disk: Arc<dyn DiskProvider>,
    pub catalog: Arc<dyn TitleCatalog>,
    pub history: Arc<dyn HistoryProvider>,
    pub naming: Arc<dyn NamingBuilder>,
    pub media_info: Arc<dyn MediaInfoReader>,
    pub media_index: Arc<dyn MediaFileIndex>,
    pub scanner: Arc<dyn VirusScanner>,
}

/// State of one import, passed from phase to phase.
struct ImportContext<'a> {
    /// Folder or file being imported.
    source: PathBuf,
    /// Source name with download markers removed.
    release_name: String,
    parsed: Option<ParsedReleaseInfo>,
    title: Title,
    download: Option<&'a DownloadHandle>,
    transfer: TransferMode,
}

impl ImportContext<'_> {
    fn claimed_group(&self) -> Option<&str> {
        self.parsed.as_ref().and_then(|p| p.release_group.as_deref())
    }

    fn reject(&self, rejection: Rejection) -> Vec<ImportOutcome> {
        vec![ImportOutcome::rejected_path(
            &self.source,
            Some(&self.title),
            rejection,
        )]
    }
}

pub struct DownloadedImportService {
    services: ImportServices,
    settings: ImportSettings,
    decision_maker: ImportDecisionMaker,
    importer: ImportApprovedTitles,
    validator: ReleaseStructureValidator,
    sample_detector: SampleDetector,
}

impl DownloadedImportService {
    pub fn new(services: ImportServices, settings: ImportSettings) -> Self {
        let specifications = default_specifications(
            services.disk.clone(),
            services.history.clone(),
            services.media_info.clone(),
            &settings,
        );
        let decision_maker = ImportDecisionMaker::new(
            specifications,
            services.disk.clone(),
            services.catalog.clone(),
            services.media_info.clone(),
        );
        let organizer = FileOrganizer::new(
            services.disk.clone(),
            services.naming.clone(),
            services.media_index.clone(),
            services.catalog.clone(),
            settings.recycle_bin.clone(),
        );
        let importer = ImportApprovedTitles::new(organizer, services.media_index.clone());
        let validator = ReleaseStructureValidator::new(services.disk.clone());
        let sample_detector = SampleDetector::new(services.media_info.clone());

        Self {
            services,
            settings,
            decision_maker,
            importer,
            validator,
            sample_detector,
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import every download under `root`. A failure in one entry is logged
    /// and the next entry is processed.
    pub fn process_root_folder(&self, root: &Path) -> Vec<ImportOutcome> {
        let disk = &self.services.disk;
        let mut outcomes = Vec::new();

        let directories = match disk.get_directories(root) {
            Ok(dirs) => dirs,
            Err(e) => {
                log::error!("Unable to list download folder {}: {}", root.display(), e);
                return outcomes;
            }
        };
        for dir in directories.iter().filter(|d| !self.is_reserved_folder(d)) {
            match self.process_path(dir, ImportMode::Auto, None, None) {
                Ok(results) => outcomes.extend(results),
                Err(e) => log::error!("Failed to import folder {}: {}", dir.display(), e),
            }
        }

        let files = match disk.get_files(root, false) {
            Ok(files) => files,
            Err(e) => {
                log::error!("Unable to list files in {}: {}", root.display(), e);
                return outcomes;
            }
        };
        for file in files.iter().filter(|f| is_loose_media(f)) {
            match self.process_path(file, ImportMode::Auto, None, None) {
                Ok(results) => outcomes.extend(results),
                Err(e) => log::error!("Failed to import file {}: {}", file.display(), e),
            }
        }

        outcomes
    }

    /// Import one folder or file. Transfer failures after a decision was
    /// approved come back as `Err`.
    pub fn process_path(
        &self,
        path: &Path,
        mode: ImportMode,
        title: Option<&Title>,
        download: Option<&DownloadHandle>,
    ) -> ImportResult<Vec<ImportOutcome>> {
        let transfer = mode.resolve(download);

        if self.services.disk.folder_exists(path) {
            return self.process_folder(path, transfer, title, download);
        }
        if self.services.disk.file_exists(path) {
            return self.process_file(path, transfer, title, download);
        }

        log::error!(
            "Import failed, path does not exist or is not accessible: {}",
            path.display()
        );
        Ok(Vec::new())
    }

    fn process_folder(
        &self,
        dir: &Path,
        transfer: TransferMode,
        title: Option<&Title>,
        download: Option<&DownloadHandle>,
    ) -> ImportResult<Vec<ImportOutcome>> {
        let name = file_name_of(dir);
        let release_name = strip_download_markers(&name).to_string();

        let ctx = match self.build_context(dir, release_name, title, download, transfer)? {
            Ok(ctx) => ctx,
            Err(outcome) => return Ok(vec![outcome]),
        };
        if let Some(rejection) = self.pre_import_checks(&ctx)? {
            return Ok(ctx.reject(rejection));
        }

        let files = self.services.disk.get_files(dir, true)?;
        let layout = FolderLayout::classify(dir, files);
        let folder_mode = layout.is_folder_release();
        let paths = if folder_mode {
            vec![dir.to_path_buf()]
        } else {
            layout.media.clone()
        };
        log::debug!(
            "{} in {} mode with {} candidate(s)",
            dir.display(),
            if folder_mode { "folder" } else { "file" },
            paths.len()
        );

        let outcomes =
            self.decide_and_import(&ctx, &paths, &layout, !folder_mode, ctx.parsed.as_ref())?;

        if !folder_mode
            && ctx.transfer == TransferMode::Move
            && outcomes.iter().any(|o| o.is_imported())
        {
            self.clean_up_folder(&ctx);
        }

        Ok(outcomes)
    }

    fn process_file(
        &self,
        file: &Path,
        transfer: TransferMode,
        title: Option<&Title>,
        download: Option<&DownloadHandle>,
    ) -> ImportResult<Vec<ImportOutcome>> {
        if self.services.disk.is_file_locked(file) {
            log::warn!(
                "Skipping {}, it is in use by another process",
                file.display()
            );
            return Ok(Vec::new());
        }

        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let release_name = strip_download_markers(&stem).to_string();

        let ctx = match self.build_context(file, release_name, title, download, transfer)? {
            Ok(ctx) => ctx,
            Err(outcome) => return Ok(vec![outcome]),
        };
        if let Some(rejection) = self.pre_import_checks(&ctx)? {
            return Ok(ctx.reject(rejection));
        }

        let parent = file.parent().unwrap_or(file);
        let layout = FolderLayout::classify(parent, [file.to_path_buf()]);
        let paths = layout.media.clone();

        self.decide_and_import(&ctx, &paths, &layout, true, None)
    }

    /// Parse the source name and settle on a title. The inner `Err` is the
    /// outcome to return when no title can be found.
    fn build_context<'a>(
        &self,
        source: &Path,
        release_name: String,
        title: Option<&Title>,
        download: Option<&'a DownloadHandle>,
        transfer: TransferMode,
    ) -> ImportResult<Result<ImportContext<'a>, ImportOutcome>> {
        let parsed = parse_release_name(&release_name);

        let title = match title {
            Some(title) => Some(title.clone()),
            None => match parsed.as_ref() {
                Some(info) => self.services.catalog.resolve_by_name(&info.title)?,
                None => None,
            },
        };

        let Some(title) = title else {
            log::warn!("Unknown game for {}", source.display());
            return Ok(Err(ImportOutcome::rejected_path(
                source,
                None,
                Rejection::new(RejectionReason::UnresolvedTitle, "Unknown Game"),
            )));
        };

        Ok(Ok(ImportContext {
            source: source.to_path_buf(),
            release_name,
            parsed,
            title,
            download,
            transfer,
        }))
    }

    /// Library-folder, structure and virus checks, in that order.
    fn pre_import_checks(&self, ctx: &ImportContext) -> ImportResult<Option<Rejection>> {
        if ctx.source.starts_with(&ctx.title.path)
            || self.services.catalog.find_by_path(&ctx.source)?.is_some()
        {
            log::warn!(
                "{} is inside the library folder of '{}'",
                ctx.source.display(),
                ctx.title.name
            );
            return Ok(Some(Rejection::new(
                RejectionReason::TitlePathIsSource,
                "Import path is the game's library folder",
            )));
        }

        if let Some(rejection) = self.check_structure(ctx) {
            return Ok(Some(rejection));
        }

        Ok(self.check_virus(ctx))
    }

    fn check_structure(&self, ctx: &ImportContext) -> Option<Rejection> {
        if !self.settings.validate_release_structure {
            return None;
        }

        let validation =
            self.validator
                .validate(&ctx.source, ctx.claimed_group(), &ctx.release_name);
        if validation.valid {
            log::debug!("'{}': {}", ctx.release_name, validation.message);
            return None;
        }

        if validation.confidence < StructureConfidence::High {
            log::info!(
                "Structure check for '{}' is inconclusive ({:?}): {}",
                ctx.release_name,
                validation.confidence,
                validation.message
            );
            return None;
        }

        let reason = if validation.suspicious_files.is_empty() {
            RejectionReason::StructureMismatch
        } else {
            RejectionReason::SuspiciousFiles
        };
        Some(Rejection::new(reason, validation.message))
    }

    fn check_virus(&self, ctx: &ImportContext) -> Option<Rejection> {
        let scanner = &self.services.scanner;
        if !scanner.is_available() {
            return None;
        }

        let result = scanner.scan(&ctx.source);
        if !result.completed {
            let error = result.error.unwrap_or_default();
            log::warn!(
                "Virus scan of {} did not complete: {}",
                ctx.source.display(),
                error
            );
            if self.settings.reject_on_incomplete_scan {
                return Some(Rejection::new(
                    RejectionReason::ScanIncomplete,
                    format!("Virus scan did not complete: {error}"),
                ));
            }
            return None;
        }

        if result.is_clean {
            log::debug!(
                "{} is clean ({} files scanned)",
                ctx.source.display(),
                result.scanned_files
            );
            return None;
        }

        let summary = result.threat_summary();
        log::error!("Infected content in {}: {}", ctx.source.display(), summary);

        if self.settings.quarantine_infected {
            let dir = self.quarantine_dir(&ctx.source);
            if let Err(e) = quarantine(&ctx.source, &dir) {
                log::error!("Failed to quarantine {}: {}", ctx.source.display(), e);
            }
        }

        Some(Rejection::new(
            RejectionReason::Infected,
            format!("Infected files found: {summary}"),
        ))
    }

    fn quarantine_dir(&self, source: &Path) -> PathBuf {
        match (&self.settings.quarantine_folder, source.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) => parent.join(QUARANTINE_DIR),
            (None, None) => PathBuf::from(QUARANTINE_DIR),
        }
    }

    fn decide_and_import(
        &self,
        ctx: &ImportContext,
        paths: &[PathBuf],
        layout: &FolderLayout,
        file_mode: bool,
        folder_info: Option<&ParsedReleaseInfo>,
    ) -> ImportResult<Vec<ImportOutcome>> {
        let request = DecisionRequest {
            title: Some(&ctx.title),
            download: ctx.download,
            folder_info,
            new_download: true,
        };
        let decisions = self.decision_maker.get_import_decisions(paths, &request);

        let leftover = if file_mode && !decisions.iter().any(|d| d.approved()) {
            self.leftover_rejection(layout)
        } else {
            None
        };

        if decisions.is_empty() {
            let rejection = leftover.unwrap_or_else(|| {
                Rejection::new(
                    RejectionReason::NoGameFiles,
                    "No game files were found in the selected folder",
                )
            });
            log::warn!("{}: {}", ctx.source.display(), rejection.message);
            return Ok(ctx.reject(rejection));
        }

        let mut outcomes = self
            .importer
            .import(decisions, true, ctx.download, ctx.transfer)?;
        if let Some(rejection) = leftover {
            outcomes.extend(ctx.reject(rejection));
        }
        Ok(outcomes)
    }

    /// Why nothing was importable, when the leftovers tell us.
    fn leftover_rejection(&self, layout: &FolderLayout) -> Option<Rejection> {
        if let Some(dangerous) = layout.dangerous.first() {
            let ext = dangerous
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            return Some(Rejection::new(
                RejectionReason::DangerousFile,
                format!("Caution: Found potentially dangerous file with extension: .{ext}"),
            ));
        }

        let threshold = self.settings.archive_size_threshold_bytes();
        let large_archive = layout.archives.iter().any(|archive| {
            self.services
                .disk
                .get_file_size(archive)
                .map(|size| size > threshold)
                .unwrap_or(false)
        });
        if large_archive {
            return Some(Rejection::new(
                RejectionReason::UnextractedArchive,
                "Found archive file, might need to be extracted",
            ));
        }

        None
    }

    /// Remove the download folder unless game media is still in it. Samples don't count.
    fn clean_up_folder(&self, ctx: &ImportContext) {
        let disk = &self.services.disk;
        let files = match disk.get_files(&ctx.source, true) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Unable to inspect {} for cleanup: {}", ctx.source.display(), e);
                return;
            }
        };

        let remaining: Vec<&PathBuf> = files
            .iter()
            .filter(|f| walker::is_media_file(f))
            .filter(|f| {
                self.sample_detector.classify(ctx.title.runtime_minutes, f)
                    != SampleClassification::Sample
            })
            .collect();

        if !remaining.is_empty() {
            log::warn!(
                "Not deleting {}, {} game file(s) remain: {}",
                ctx.source.display(),
                remaining.len(),
                remaining
                    .iter()
                    .map(|p| file_name_of(p))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return;
        }

        match disk.delete_folder(&ctx.source, true) {
            Ok(()) => log::info!("Deleted download folder {}", ctx.source.display()),
            Err(e) => log::warn!("Failed to delete {}: {}", ctx.source.display(), e),
        }
    }

    fn is_reserved_folder(&self, dir: &Path) -> bool {
        if file_name_of(dir).starts_with('.') {
            return true;
        }
        [&self.settings.recycle_bin, &self.settings.quarantine_folder]
            .into_iter()
            .flatten()
            .any(|reserved| reserved == dir)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_loose_media(path: &Path) -> bool {
    let name = file_name_of(path);
    !name.starts_with('.') && !walker::is_ignored_name(&name) && walker::is_media_file(path)
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
