use super::*;
use crate::services::fs_utils::LocalDiskProvider;
use crate::services::import::naming::StandardNamingBuilder;
use crate::services::parser::clean_title;
use crate::services::virus_scan::{InfectedFile, VirusScanResult};
use crate::test_utils::{init_logging, title_at};
use crate::types::{HistoryEvent, LibraryFile, TitleId};
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

struct Catalog(Vec<Title>);

impl TitleCatalog for Catalog {
    fn find_by_path(&self, path: &Path) -> anyhow::Result<Option<Title>> {
        Ok(self.0.iter().find(|t| path.starts_with(&t.path)).cloned())
    }

    fn resolve_by_name(&self, name: &str) -> anyhow::Result<Option<Title>> {
        let wanted = clean_title(name);
        Ok(self.0.iter().find(|t| clean_title(&t.name) == wanted).cloned())
    }

    fn set_current_file(&self, _id: TitleId, _file: Option<LibraryFile>) -> anyhow::Result<()> {
        Ok(())
    }
}

struct NoHistory;

impl HistoryProvider for NoHistory {
    fn events_for_title(&self, _title_id: TitleId) -> anyhow::Result<Vec<HistoryEvent>> {
        Ok(Vec::new())
    }
}

struct NoProbe;

impl MediaInfoReader for NoProbe {
    fn read_runtime(&self, _path: &Path) -> anyhow::Result<Option<Duration>> {
        Ok(None)
    }

    fn read_audio_stream_count(&self, _path: &Path) -> anyhow::Result<Option<u32>> {
        Ok(None)
    }
}

#[derive(Default)]
struct Index(Mutex<Vec<LibraryFile>>);

impl MediaFileIndex for Index {
    fn add(&self, mut file: LibraryFile) -> anyhow::Result<LibraryFile> {
        let mut files = self.0.lock().unwrap();
        file.id = files.len() as i64 + 1;
        files.push(file.clone());
        Ok(file)
    }

    fn delete(&self, file: &LibraryFile) -> anyhow::Result<()> {
        self.0.lock().unwrap().retain(|f| f.id != file.id);
        Ok(())
    }

    fn files_for_title(&self, title_id: TitleId) -> anyhow::Result<Vec<LibraryFile>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.title_id == title_id)
            .cloned()
            .collect())
    }
}

struct FixedScanner(VirusScanResult);

impl VirusScanner for FixedScanner {
    fn is_available(&self) -> bool {
        true
    }

    fn scan(&self, _path: &Path) -> VirusScanResult {
        self.0.clone()
    }
}

struct Fixture {
    tmp: TempDir,
    title: Title,
}

impl Fixture {
    fn new() -> Self {
        init_logging();
        let tmp = TempDir::new().unwrap();
        let title = title_at(&tmp.path().join("library/Some Game"));
        fs::create_dir_all(tmp.path().join("downloads")).unwrap();
        Self { tmp, title }
    }

    fn downloads(&self) -> PathBuf {
        self.tmp.path().join("downloads")
    }

    fn release(&self, name: &str, files: &[(&str, usize)]) -> PathBuf {
        let dir = self.downloads().join(name);
        for (file, size) in files {
            let path = dir.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, vec![1u8; *size]).unwrap();
        }
        dir
    }

    fn service(
        &self,
        scanner: Arc<dyn VirusScanner>,
        settings: ImportSettings,
    ) -> DownloadedImportService {
        let services = ImportServices {
            disk: Arc::new(LocalDiskProvider),
            catalog: Arc::new(Catalog(vec![self.title.clone()])),
            history: Arc::new(NoHistory),
            naming: Arc::new(StandardNamingBuilder),
            media_info: Arc::new(NoProbe),
            media_index: Arc::new(Index::default()),
            scanner,
        };
        DownloadedImportService::new(services, settings)
    }

    fn default_service(&self) -> DownloadedImportService {
        self.service(Arc::new(crate::services::virus_scan::NoopScanner), settings())
    }
}

fn settings() -> ImportSettings {
    ImportSettings {
        skip_free_space_check: true,
        ..ImportSettings::default()
    }
}

fn only(outcomes: &[ImportOutcome]) -> &ImportOutcome {
    assert_eq!(outcomes.len(), 1, "{outcomes:?}");
    &outcomes[0]
}

#[test]
fn test_missing_path_yields_nothing() {
    let fx = Fixture::new();
    let outcomes = fx
        .default_service()
        .process_path(&fx.downloads().join("gone"), ImportMode::Auto, None, None)
        .unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn test_unknown_title_is_unresolved() {
    let fx = Fixture::new();
    let dir = fx.release("Other.Game-CODEX", &[("codex.nfo", 10), ("other.iso", 10)]);

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Auto, None, None)
        .unwrap();

    let outcome = only(&outcomes);
    assert!(outcome.has_reason(RejectionReason::UnresolvedTitle));
    assert_eq!(outcome.title_id(), None);
    assert!(dir.join("other.iso").exists());
}

#[test]
fn test_download_markers_are_stripped_before_resolving() {
    let fx = Fixture::new();
    let dir = fx.release("_UNPACK_Some.Game-CODEX", &[("codex.nfo", 10), ("game.iso", 10)]);

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Copy, None, None)
        .unwrap();

    assert!(only(&outcomes).is_imported());
    assert_eq!(only(&outcomes).title_id(), Some(fx.title.id));
}

#[test]
fn test_library_folder_is_not_a_source() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.title.path).unwrap();
    fs::write(fx.title.path.join("game.iso"), b"iso").unwrap();

    let outcomes = fx
        .default_service()
        .process_path(&fx.title.path, ImportMode::Auto, Some(&fx.title), None)
        .unwrap();

    assert!(only(&outcomes).has_reason(RejectionReason::TitlePathIsSource));
}

#[test]
fn test_spoofed_group_is_rejected() {
    let fx = Fixture::new();
    let dir = fx.release(
        "Some.Game-CODEX",
        &[("setup.exe", 10), ("fg-01.bin", 10), ("MD5/checksums.md5", 10)],
    );

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    let outcome = only(&outcomes);
    assert!(outcome.has_reason(RejectionReason::StructureMismatch));
    assert!(outcome.rejections[0].message.contains("CODEX"));
    assert!(outcome.rejections[0].message.contains("FitGirl"));
    assert!(dir.join("setup.exe").exists());
}

#[test]
fn test_suspicious_file_rejects() {
    let fx = Fixture::new();
    let dir = fx.release(
        "Some.Game-CODEX",
        &[("codex.nfo", 10), ("game.iso", 10), ("free.scr", 10)],
    );

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    assert!(only(&outcomes).has_reason(RejectionReason::SuspiciousFiles));
}

#[test]
fn test_unknown_group_is_not_disqualifying() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-NOBODY", &[("game.iso", 10)]);

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Copy, None, None)
        .unwrap();

    assert!(only(&outcomes).is_imported());
}

#[test]
fn test_infected_download_is_quarantined() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("game.iso", 10)]);
    let infected = VirusScanResult {
        completed: true,
        is_clean: false,
        infected_files: vec![InfectedFile {
            path: dir.join("game.iso"),
            threat: "Win.Trojan.Agent".into(),
        }],
        scanned_files: 2,
        error: None,
    };

    let outcomes = fx
        .service(Arc::new(FixedScanner(infected)), settings())
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    let outcome = only(&outcomes);
    assert!(outcome.has_reason(RejectionReason::Infected));
    assert!(outcome.rejections[0].message.contains("Win.Trojan.Agent"));
    assert!(!dir.exists());
    let quarantined = fs::read_dir(fx.downloads().join(".quarantine")).unwrap().count();
    assert_eq!(quarantined, 1);
}

#[test]
fn test_incomplete_scan_rejects_only_when_configured() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("game.iso", 10)]);
    let scanner: Arc<dyn VirusScanner> =
        Arc::new(FixedScanner(VirusScanResult::incomplete("clamscan exited with 2")));

    let strict = ImportSettings {
        reject_on_incomplete_scan: true,
        ..settings()
    };
    let outcomes = fx
        .service(scanner.clone(), strict)
        .process_path(&dir, ImportMode::Copy, None, None)
        .unwrap();
    assert!(only(&outcomes).has_reason(RejectionReason::ScanIncomplete));

    let outcomes = fx
        .service(scanner, settings())
        .process_path(&dir, ImportMode::Copy, None, None)
        .unwrap();
    assert!(only(&outcomes).is_imported());
}

#[test]
fn test_dangerous_leftover_is_explained() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("readme.vbs", 10)]);
    let lenient = ImportSettings {
        validate_release_structure: false,
        ..settings()
    };

    let outcomes = fx
        .service(Arc::new(crate::services::virus_scan::NoopScanner), lenient)
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    let outcome = only(&outcomes);
    assert!(outcome.has_reason(RejectionReason::DangerousFile));
    assert_eq!(
        outcome.rejections[0].message,
        "Caution: Found potentially dangerous file with extension: .vbs"
    );
}

#[test]
fn test_large_archive_leftover_is_explained() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("game.rar", 2 * 1024 * 1024)]);
    let small_threshold = ImportSettings {
        archive_size_threshold_mb: 1,
        ..settings()
    };

    let outcomes = fx
        .service(Arc::new(crate::services::virus_scan::NoopScanner), small_threshold)
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    assert!(only(&outcomes).has_reason(RejectionReason::UnextractedArchive));
}

#[test]
fn test_empty_release_has_no_game_files() {
    let fx = Fixture::new();
    let dir = fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("small.rar", 10)]);

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    assert!(only(&outcomes).has_reason(RejectionReason::NoGameFiles));
}

#[test]
fn test_installer_release_moves_whole_folder() {
    let fx = Fixture::new();
    let dir = fx.release(
        "Some Game [FitGirl Repack]",
        &[("setup.exe", 10), ("fg-01.bin", 10), ("fg-02.bin", 10)],
    );

    let outcomes = fx
        .default_service()
        .process_path(&dir, ImportMode::Move, None, None)
        .unwrap();

    let outcome = only(&outcomes);
    assert!(outcome.is_imported(), "{outcome:?}");
    let file = outcome.imported_file.as_ref().unwrap();
    assert!(file.is_folder());
    assert!(fx.title.path.join("setup.exe").exists());
    assert!(fx.title.path.join("fg-02.bin").exists());
    assert!(!dir.exists());
}

#[test]
fn test_loose_file_imports() {
    let fx = Fixture::new();
    let file = fx.downloads().join("Some.Game.ISO-NOBODY.iso");
    fs::write(&file, b"iso").unwrap();

    let outcomes = fx
        .default_service()
        .process_path(&file, ImportMode::Move, None, None)
        .unwrap();

    assert!(only(&outcomes).is_imported());
    assert!(fx.title.path.join("Some Game (2020).iso").exists());
    assert!(!file.exists());
}

#[test]
fn test_root_folder_skips_reserved_and_hidden_entries() {
    let fx = Fixture::new();
    fx.release("Some.Game-CODEX", &[("codex.nfo", 10), ("game.iso", 10)]);
    fx.release(".quarantine/Some.Game-CODEX_20240101000000", &[("game.iso", 10)]);
    fx.release(".hidden", &[("game.iso", 10)]);
    fs::write(fx.downloads().join("Thumbs.db"), b"x").unwrap();
    fs::write(fx.downloads().join("notes.txt"), b"x").unwrap();

    let outcomes = fx.default_service().process_root_folder(&fx.downloads());

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_imported());
    assert!(!fx.downloads().join("Some.Game-CODEX").exists());
    assert!(fx.downloads().join(".hidden/game.iso").exists());
}
