pub mod models;

pub use models::*;

use crate::types::errors::ImportError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ENV_MIN_FREE_SPACE_MB: &str = "GAMARR_MIN_FREE_SPACE_MB";
pub const ENV_VIRUS_SCANNER_PATH: &str = "GAMARR_VIRUS_SCANNER_PATH";
pub const ENV_RECYCLE_BIN: &str = "GAMARR_RECYCLE_BIN";

/// JSON-file backed settings with environment overrides.
pub struct ConfigService {
    path: PathBuf,
    settings: Mutex<ImportSettings>,
}

impl ConfigService {
    /// Load settings from `path`. A missing or broken file falls back to defaults.
    pub fn new(path: PathBuf) -> Self {
        let _ = dotenvy::dotenv();

        let mut settings = Self::load_from_file(&path);
        apply_overrides(&mut settings, |key| std::env::var(key).ok());

        Self {
            path,
            settings: Mutex::new(settings),
        }
    }

    fn load_from_file(path: &Path) -> ImportSettings {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return ImportSettings::default();
            }
            Err(e) => {
                log::error!("Failed to read config {}: {e}", path.display());
                return ImportSettings::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::error!("Invalid config {}: {e}", path.display());
            ImportSettings::default()
        })
    }

    pub fn get_settings(&self) -> ImportSettings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Persist via temp file + rename, then swap the in-memory copy.
    pub fn save_settings(&self, new_settings: ImportSettings) -> Result<(), ImportError> {
        let dir = self
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(&new_settings)
            .map_err(|e| ImportError::Config(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| ImportError::Io(e.error))?;

        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_settings;
        Ok(())
    }
}

/// Overlay environment values on top of file settings. Unparseable values are ignored.
pub fn apply_overrides(settings: &mut ImportSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup(ENV_MIN_FREE_SPACE_MB) {
        match raw.trim().parse::<u64>() {
            Ok(mb) => settings.minimum_free_space_mb = mb,
            Err(_) => log::warn!("Ignoring {ENV_MIN_FREE_SPACE_MB}={raw}: not a number"),
        }
    }

    if let Some(path) = lookup(ENV_VIRUS_SCANNER_PATH).filter(|p| !p.trim().is_empty()) {
        settings.virus_scanner_path = Some(PathBuf::from(path));
    }

    if let Some(path) = lookup(ENV_RECYCLE_BIN).filter(|p| !p.trim().is_empty()) {
        settings.recycle_bin = Some(PathBuf::from(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = ConfigService::load_from_file(&dir.path().join("none.json"));
        assert_eq!(settings.minimum_free_space_mb, 100);
        assert!(settings.validate_release_structure);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "virus_scan_enabled": true, "archive_size_threshold_mb": 50 }"#)
            .unwrap();

        let settings = ConfigService::load_from_file(&path);
        assert!(settings.virus_scan_enabled);
        assert_eq!(settings.archive_size_threshold_mb, 50);
        assert_eq!(settings.minimum_free_space_mb, 100);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(ConfigService::load_from_file(&path), ImportSettings::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_MIN_FREE_SPACE_MB, "2048"),
            (ENV_VIRUS_SCANNER_PATH, "/opt/clamav/bin/clamscan"),
            (ENV_RECYCLE_BIN, ""),
        ]);
        let mut settings = ImportSettings::default();
        apply_overrides(&mut settings, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.minimum_free_space_mb, 2048);
        assert_eq!(
            settings.virus_scanner_path,
            Some(PathBuf::from("/opt/clamav/bin/clamscan"))
        );
        assert_eq!(settings.recycle_bin, None);
    }

    #[test]
    fn test_bad_env_number_is_ignored() {
        let mut settings = ImportSettings::default();
        apply_overrides(&mut settings, |k| {
            (k == ENV_MIN_FREE_SPACE_MB).then(|| "lots".to_string())
        });
        assert_eq!(settings.minimum_free_space_mb, 100);
    }
}
