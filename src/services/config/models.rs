use crate::services::quality::ProperDownloadTypes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Import engine settings. Missing keys in a saved file fall back to the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImportSettings {
    /// Space that must stay free on the library volume after an import.
    pub minimum_free_space_mb: u64,
    pub skip_free_space_check: bool,
    pub proper_download_types: ProperDownloadTypes,
    pub validate_release_structure: bool,
    pub virus_scan_enabled: bool,
    /// Scanner executable; auto-detected when unset.
    pub virus_scanner_path: Option<PathBuf>,
    pub virus_scanner_arguments: Option<String>,
    pub quarantine_infected: bool,
    /// Defaults to `.quarantine` under the download root.
    pub quarantine_folder: Option<PathBuf>,
    /// Defaults to `.recycle` under the title's root folder.
    pub recycle_bin: Option<PathBuf>,
    /// Archives above this size are reported as not yet extracted.
    pub archive_size_threshold_mb: u64,
    pub reject_on_incomplete_scan: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            minimum_free_space_mb: 100,
            skip_free_space_check: false,
            proper_download_types: ProperDownloadTypes::PreferAndUpgrade,
            validate_release_structure: true,
            virus_scan_enabled: false,
            virus_scanner_path: None,
            virus_scanner_arguments: None,
            quarantine_infected: true,
            quarantine_folder: None,
            recycle_bin: None,
            archive_size_threshold_mb: 10,
            reject_on_incomplete_scan: false,
        }
    }
}

impl ImportSettings {
    pub fn minimum_free_space_bytes(&self) -> u64 {
        self.minimum_free_space_mb.saturating_mul(1024 * 1024)
    }

    pub fn archive_size_threshold_bytes(&self) -> u64 {
        self.archive_size_threshold_mb.saturating_mul(1024 * 1024)
    }
}
