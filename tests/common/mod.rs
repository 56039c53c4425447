#![allow(dead_code)]

use gamarr_lib::services::config::ImportSettings;
use gamarr_lib::services::fs_utils::{DiskProvider, LocalDiskProvider};
use gamarr_lib::services::import::{
    DownloadedImportService, HistoryProvider, ImportServices, MediaFileIndex, MediaInfoReader,
    StandardNamingBuilder, TitleCatalog,
};
use gamarr_lib::services::parser::clean_title;
use gamarr_lib::services::quality::{QualityModel, QualityProfile};
use gamarr_lib::services::virus_scan::{VirusScanResult, VirusScanner};
use gamarr_lib::types::{HistoryEvent, LibraryFile, MinimumAvailability, Title, TitleId};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Default)]
pub struct MemoryCatalog {
    pub titles: Mutex<Vec<Title>>,
    /// `resolve_by_name` errors for names containing this text.
    pub fail_on: Mutex<Option<String>>,
}

impl MemoryCatalog {
    pub fn with(titles: Vec<Title>) -> Self {
        Self {
            titles: Mutex::new(titles),
            fail_on: Mutex::new(None),
        }
    }

    pub fn title(&self, id: TitleId) -> Option<Title> {
        self.titles.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }
}

impl TitleCatalog for MemoryCatalog {
    fn find_by_path(&self, path: &Path) -> anyhow::Result<Option<Title>> {
        Ok(self
            .titles
            .lock()
            .unwrap()
            .iter()
            .find(|t| path.starts_with(&t.path))
            .cloned())
    }

    fn resolve_by_name(&self, name: &str) -> anyhow::Result<Option<Title>> {
        if let Some(fail_on) = self.fail_on.lock().unwrap().as_deref() {
            if name.contains(fail_on) {
                anyhow::bail!("catalog unavailable for '{name}'");
            }
        }
        let wanted = clean_title(name);
        Ok(self
            .titles
            .lock()
            .unwrap()
            .iter()
            .find(|t| clean_title(&t.name) == wanted)
            .cloned())
    }

    fn set_current_file(&self, title_id: TitleId, file: Option<LibraryFile>) -> anyhow::Result<()> {
        if let Some(title) = self
            .titles
            .lock()
            .unwrap()
            .iter_mut()
            .find(|t| t.id == title_id)
        {
            title.current_file = file;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistory(pub Mutex<Vec<HistoryEvent>>);

impl HistoryProvider for MemoryHistory {
    fn events_for_title(&self, title_id: TitleId) -> anyhow::Result<Vec<HistoryEvent>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.title_id == title_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryIndex {
    pub files: Mutex<Vec<LibraryFile>>,
    next_id: Mutex<i64>,
}

impl MemoryIndex {
    pub fn all(&self) -> Vec<LibraryFile> {
        self.files.lock().unwrap().clone()
    }
}

impl MediaFileIndex for MemoryIndex {
    fn add(&self, mut file: LibraryFile) -> anyhow::Result<LibraryFile> {
        if file.id == 0 {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            file.id = *next;
        }
        self.files.lock().unwrap().push(file.clone());
        Ok(file)
    }

    fn delete(&self, file: &LibraryFile) -> anyhow::Result<()> {
        self.files.lock().unwrap().retain(|f| f.id != file.id);
        Ok(())
    }

    fn files_for_title(&self, title_id: TitleId) -> anyhow::Result<Vec<LibraryFile>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.title_id == title_id)
            .cloned()
            .collect())
    }
}

/// Media probe keyed by file name.
#[derive(Default)]
pub struct FakeMediaInfo {
    /// Probing fails for names containing any of these.
    pub failing: Mutex<Vec<String>>,
    pub runtimes: Mutex<HashMap<String, Duration>>,
    pub audio_streams: Mutex<HashMap<String, u32>>,
}

impl FakeMediaInfo {
    fn key(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn check(&self, path: &Path) -> anyhow::Result<()> {
        let name = Self::key(path);
        if self.failing.lock().unwrap().iter().any(|f| name.contains(f.as_str())) {
            anyhow::bail!("media probe crashed on {name}");
        }
        Ok(())
    }
}

impl MediaInfoReader for FakeMediaInfo {
    fn read_runtime(&self, path: &Path) -> anyhow::Result<Option<Duration>> {
        self.check(path)?;
        Ok(self.runtimes.lock().unwrap().get(&Self::key(path)).copied())
    }

    fn read_audio_stream_count(&self, path: &Path) -> anyhow::Result<Option<u32>> {
        self.check(path)?;
        Ok(self.audio_streams.lock().unwrap().get(&Self::key(path)).copied())
    }
}

/// Local disk with a fixed free-space answer.
pub struct FixedSpaceDisk {
    inner: LocalDiskProvider,
    pub free: Mutex<Option<u64>>,
}

impl FixedSpaceDisk {
    pub fn new(free: Option<u64>) -> Self {
        Self {
            inner: LocalDiskProvider,
            free: Mutex::new(free),
        }
    }
}

impl DiskProvider for FixedSpaceDisk {
    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }

    fn folder_exists(&self, path: &Path) -> bool {
        self.inner.folder_exists(path)
    }

    fn get_files(&self, folder: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        self.inner.get_files(folder, recursive)
    }

    fn get_directories(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.get_directories(folder)
    }

    fn get_file_size(&self, path: &Path) -> io::Result<u64> {
        self.inner.get_file_size(path)
    }

    fn get_folder_size(&self, path: &Path) -> io::Result<u64> {
        self.inner.get_folder_size(path)
    }

    fn free_space(&self, _path: &Path) -> anyhow::Result<Option<u64>> {
        Ok(*self.free.lock().unwrap())
    }

    fn is_file_locked(&self, path: &Path) -> bool {
        self.inner.is_file_locked(path)
    }

    fn create_folder(&self, path: &Path) -> io::Result<()> {
        self.inner.create_folder(path)
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.move_path(from, to)
    }

    fn copy_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.copy_path(from, to)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        self.inner.delete_file(path)
    }

    fn delete_folder(&self, path: &Path, recursive: bool) -> io::Result<()> {
        self.inner.delete_folder(path, recursive)
    }
}

/// Scanner returning a preset result. Unavailable when none is set.
#[derive(Default)]
pub struct FakeScanner(pub Mutex<Option<VirusScanResult>>);

impl VirusScanner for FakeScanner {
    fn is_available(&self) -> bool {
        self.0.lock().unwrap().is_some()
    }

    fn scan(&self, _path: &Path) -> VirusScanResult {
        self.0
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| VirusScanResult::incomplete("no scanner"))
    }
}

pub fn title(id: TitleId, name: &str, path: &Path) -> Title {
    Title {
        id,
        name: name.into(),
        year: Some(2020),
        path: path.to_path_buf(),
        quality_profile: QualityProfile::default(),
        minimum_availability: MinimumAvailability::Released,
        monitored: true,
        runtime_minutes: 0,
        current_file: None,
    }
}

pub fn library_file(title_id: TitleId, relative_path: &str, quality: QualityModel) -> LibraryFile {
    LibraryFile {
        id: 0,
        title_id,
        relative_path: relative_path.into(),
        quality,
        format_score: 0,
        release_group: None,
        scene_name: None,
        size: 3,
        media_info: None,
        date_added: chrono::Utc::now(),
        original_file_path: None,
    }
}

pub fn write_file(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![7u8; size]).unwrap();
}

pub struct TestContext {
    pub dir: TempDir,
    pub catalog: Arc<MemoryCatalog>,
    pub history: Arc<MemoryHistory>,
    pub index: Arc<MemoryIndex>,
    pub media_info: Arc<FakeMediaInfo>,
    pub disk: Arc<FixedSpaceDisk>,
    pub scanner: Arc<FakeScanner>,
}

impl TestContext {
    pub fn downloads(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    pub fn library(&self) -> PathBuf {
        self.dir.path().join("library")
    }

    pub fn add_title(&self, id: TitleId, name: &str) -> Title {
        let title = title(id, name, &self.library().join(name));
        self.catalog.titles.lock().unwrap().push(title.clone());
        title
    }

    pub fn settings(&self) -> ImportSettings {
        ImportSettings {
            recycle_bin: Some(self.dir.path().join("recycle")),
            ..ImportSettings::default()
        }
    }

    pub fn services(&self) -> ImportServices {
        ImportServices {
            disk: self.disk.clone(),
            catalog: self.catalog.clone(),
            history: self.history.clone(),
            naming: Arc::new(StandardNamingBuilder),
            media_info: self.media_info.clone(),
            media_index: self.index.clone(),
            scanner: self.scanner.clone(),
        }
    }

    pub fn service(&self) -> DownloadedImportService {
        self.service_with(self.settings())
    }

    pub fn service_with(&self, settings: ImportSettings) -> DownloadedImportService {
        DownloadedImportService::new(self.services(), settings)
    }
}

pub fn init_test_context() -> TestContext {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("downloads")).unwrap();
    fs::create_dir_all(dir.path().join("library")).unwrap();

    TestContext {
        dir,
        catalog: Arc::new(MemoryCatalog::default()),
        history: Arc::new(MemoryHistory::default()),
        index: Arc::new(MemoryIndex::default()),
        media_info: Arc::new(FakeMediaInfo::default()),
        disk: Arc::new(FixedSpaceDisk::new(Some(u64::MAX))),
        scanner: Arc::new(FakeScanner::default()),
    }
}
