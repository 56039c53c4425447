//! Virus scanning of downloaded content before it reaches the library.

pub mod clamav;
pub mod quarantine;

pub use clamav::ClamAvScanner;
pub use quarantine::quarantine;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectedFile {
    pub path: PathBuf,
    pub threat: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirusScanResult {
    /// The scanner ran to the end. An incomplete scan proves nothing.
    pub completed: bool,
    pub is_clean: bool,
    pub infected_files: Vec<InfectedFile>,
    pub scanned_files: u64,
    pub error: Option<String>,
}

impl VirusScanResult {
    pub fn clean(scanned_files: u64) -> Self {
        Self {
            completed: true,
            is_clean: true,
            infected_files: Vec::new(),
            scanned_files,
            error: None,
        }
    }

    /// Scanner could not run. Reported clean so callers decide whether to trust it.
    pub fn incomplete(error: impl Into<String>) -> Self {
        Self {
            completed: false,
            is_clean: true,
            infected_files: Vec::new(),
            scanned_files: 0,
            error: Some(error.into()),
        }
    }

    pub fn threat_summary(&self) -> String {
        self.infected_files
            .iter()
            .map(|f| format!("{} ({})", f.path.display(), f.threat))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub trait VirusScanner: Send + Sync {
    fn is_available(&self) -> bool;
    fn scan(&self, path: &Path) -> VirusScanResult;
}

/// Scanner used when scanning is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScanner;

impl VirusScanner for NoopScanner {
    fn is_available(&self) -> bool {
        false
    }

    fn scan(&self, _path: &Path) -> VirusScanResult {
        VirusScanResult::incomplete("Virus scanning is disabled")
    }
}
