//! Checks a release's on-disk layout against its claimed group.

use super::fingerprints;
use crate::services::fs_utils::DiskProvider;
use crate::services::scanner::walker;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureConfidence {
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureValidation {
    pub valid: bool,
    pub confidence: StructureConfidence,
    pub claimed_group: Option<String>,
    pub detected_group: Option<String>,
    pub suspicious_files: Vec<String>,
    pub message: String,
}

impl StructureValidation {
    fn new(claimed_group: Option<&str>) -> Self {
        Self {
            valid: true,
            confidence: StructureConfidence::Unknown,
            claimed_group: claimed_group.map(str::to_string),
            detected_group: None,
            suspicious_files: Vec::new(),
            message: String::new(),
        }
    }

    fn verdict(mut self, valid: bool, confidence: StructureConfidence, message: String) -> Self {
        self.valid = valid;
        self.confidence = confidence;
        self.message = message;
        self
    }
}

#[derive(Clone)]
pub struct ReleaseStructureValidator {
    disk: Arc<dyn DiskProvider>,
}

impl ReleaseStructureValidator {
    pub fn new(disk: Arc<dyn DiskProvider>) -> Self {
        Self { disk }
    }

    pub fn validate(
        &self,
        path: &Path,
        claimed_group: Option<&str>,
        release_name: &str,
    ) -> StructureValidation {
        let claimed_group = claimed_group.map(str::trim).filter(|g| !g.is_empty());
        let result = StructureValidation::new(claimed_group);

        let files = if self.disk.folder_exists(path) {
            self.relative_files(path)
        } else if self.disk.file_exists(path) {
            path.file_name()
                .map(|n| vec![n.to_string_lossy().to_string()])
                .unwrap_or_default()
        } else {
            return result.verdict(
                false,
                StructureConfidence::Unknown,
                "Path does not exist".to_string(),
            );
        };

        log::debug!(
            "Validating structure of '{}' ({} files, claimed group {:?})",
            release_name,
            files.len(),
            claimed_group
        );

        validate_files(&files, claimed_group, result)
    }

    fn relative_files(&self, root: &Path) -> Vec<String> {
        match self.disk.get_files(root, true) {
            Ok(files) => files
                .iter()
                .filter_map(|f| f.strip_prefix(root).ok())
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                .collect(),
            Err(e) => {
                log::warn!("Failed to list files in {}: {}", root.display(), e);
                Vec::new()
            }
        }
    }
}

fn validate_files(
    files: &[String],
    claimed_group: Option<&str>,
    mut result: StructureValidation,
) -> StructureValidation {
    let suspicious: Vec<String> = files
        .iter()
        .filter(|f| walker::is_dangerous_file(Path::new(f)))
        .cloned()
        .collect();

    let detected = fingerprints::best_match(files);
    result.detected_group = detected.map(|fp| fp.group().to_string());

    if !suspicious.is_empty() {
        let message = format!("Suspicious files found: {}", suspicious.join(", "));
        log::warn!("{message}");
        result.suspicious_files = suspicious;
        return result.verdict(false, StructureConfidence::High, message);
    }

    let Some(claimed) = claimed_group else {
        return match detected {
            Some(fp) => result.verdict(
                true,
                StructureConfidence::Medium,
                format!("Detected as {}", fp.group()),
            ),
            None => result.verdict(
                true,
                StructureConfidence::Low,
                "Unknown release structure (no group detected)".to_string(),
            ),
        };
    };

    let Some(expected) = fingerprints::find_fingerprint(claimed) else {
        return match detected {
            Some(fp) => result.verdict(
                true,
                StructureConfidence::Medium,
                format!(
                    "Unknown release group '{}', structure resembles {}",
                    claimed,
                    fp.group()
                ),
            ),
            None => result.verdict(
                true,
                StructureConfidence::Low,
                format!("Unknown release group '{claimed}' (cannot verify structure)"),
            ),
        };
    };

    match expected.check(files) {
        Ok(message) => {
            result.detected_group = Some(expected.group().to_string());
            result.verdict(true, StructureConfidence::High, message)
        }
        Err(failure) => match detected {
            Some(fp) => {
                let message = format!(
                    "Claimed group '{}' but structure matches '{}'",
                    claimed,
                    fp.group()
                );
                log::warn!("{message}");
                result.verdict(false, StructureConfidence::High, message)
            }
            None => {
                log::warn!("{failure}");
                result.verdict(false, StructureConfidence::Low, failure)
            }
        },
    }
}

#[cfg(test)]
#[path = "tests/structure_validator_tests.rs"]
mod tests;
