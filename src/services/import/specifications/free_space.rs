use super::{ImportSpecification, SpecDecision};
use crate::services::fs_utils::DiskProvider;
use crate::types::{Candidate, DownloadHandle, RejectionReason};
use std::sync::Arc;

const MB: u64 = 1024 * 1024;

/// The library volume must keep `minimum_free_bytes` after the candidate lands.
pub struct FreeSpaceSpecification {
    disk: Arc<dyn DiskProvider>,
    minimum_free_bytes: u64,
    skip: bool,
}

impl FreeSpaceSpecification {
    pub fn new(disk: Arc<dyn DiskProvider>, minimum_free_bytes: u64, skip: bool) -> Self {
        Self {
            disk,
            minimum_free_bytes,
            skip,
        }
    }
}

impl ImportSpecification for FreeSpaceSpecification {
    fn name(&self) -> &'static str {
        "FreeSpace"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        _download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        if self.skip {
            log::debug!("Skipping free space check");
            return Ok(SpecDecision::Accept);
        }
        if candidate.existing_file {
            log::debug!("Skipping free space check for existing file");
            return Ok(SpecDecision::Accept);
        }

        let title = candidate.title()?;
        let volume = title.root_folder().unwrap_or(&title.path);

        let free = match self.disk.free_space(volume) {
            Ok(Some(free)) => free,
            Ok(None) => {
                log::warn!(
                    "Unable to determine free space on {}, skipping check",
                    volume.display()
                );
                return Ok(SpecDecision::Accept);
            }
            Err(e) => {
                log::warn!(
                    "Unable to check free disk space while importing {}: {e:#}",
                    candidate.path.display()
                );
                return Ok(SpecDecision::Accept);
            }
        };

        let required = candidate.size.saturating_add(self.minimum_free_bytes);
        if free < required {
            log::warn!(
                "Not enough free space ({} MB) to import {} ({} MB)",
                free / MB,
                candidate.path.display(),
                candidate.size / MB
            );
            return Ok(SpecDecision::reject(
                RejectionReason::MinimumFreeSpace,
                format!(
                    "Not enough free space: {} MB available, {} MB required",
                    free / MB,
                    required.div_ceil(MB)
                ),
            ));
        }

        Ok(SpecDecision::Accept)
    }
}
