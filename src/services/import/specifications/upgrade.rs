use super::{ImportSpecification, SpecDecision};
use crate::services::quality::{
    compare_for_upgrade, NotUpgradeReason, ProperDownloadTypes, QualitySnapshot, UpgradeVerdict,
};
use crate::types::{Candidate, DownloadHandle, RejectionReason};

/// Candidate must beat the title's current file on quality, revision or format score.
pub struct UpgradeSpecification {
    policy: ProperDownloadTypes,
}

impl UpgradeSpecification {
    pub fn new(policy: ProperDownloadTypes) -> Self {
        Self { policy }
    }
}

impl ImportSpecification for UpgradeSpecification {
    fn name(&self) -> &'static str {
        "Upgrade"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        _download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        let title = candidate.title()?;
        let Some(current) = title.current_file.as_ref() else {
            return Ok(SpecDecision::Accept);
        };

        // Rescanning the current file itself
        if candidate.existing_file && current.absolute_path(title) == candidate.path {
            return Ok(SpecDecision::Accept);
        }

        let profile = &title.quality_profile;
        if !profile.upgrade_allowed && profile.rank(current.quality.quality).is_some() {
            return Ok(SpecDecision::reject(
                RejectionReason::UpgradesNotAllowed,
                "Quality profile does not allow upgrades",
            ));
        }

        let existing = QualitySnapshot {
            quality: current.quality,
            format_score: current.current_format_score(profile),
        };
        let incoming = QualitySnapshot {
            quality: candidate.quality,
            format_score: candidate.format_score,
        };

        let reason = match compare_for_upgrade(profile, self.policy, Some(&existing), &incoming) {
            UpgradeVerdict::Upgrade => return Ok(SpecDecision::Accept),
            UpgradeVerdict::NotUpgrade(reason) => reason,
        };

        let message = match reason {
            NotUpgradeReason::LowerQuality => format!(
                "Not an upgrade for existing game file. Existing quality: {}. New quality: {}",
                existing.quality.quality, incoming.quality.quality
            ),
            NotUpgradeReason::LowerRevision => {
                "Not a quality revision upgrade for existing game file".to_string()
            }
            NotUpgradeReason::RevisionUpgradesDisabled => {
                "Proper and repack upgrades are disabled".to_string()
            }
            NotUpgradeReason::FormatScoreNotHigher => format!(
                "Not a custom format upgrade for existing game file. New score {} does not improve on existing score {}",
                incoming.format_score, existing.format_score
            ),
        };
        log::debug!("{}: {}", candidate.path.display(), message);

        Ok(SpecDecision::reject(RejectionReason::NotUpgrade, message))
    }
}
