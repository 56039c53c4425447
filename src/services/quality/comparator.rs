//! Upgrade comparison between an existing library file and a candidate.
//!
//! Axes in order: profile quality rank, revision (policy dependent), format score.

use super::models::{ProperDownloadTypes, QualityModel, QualityProfile};
use std::cmp::Ordering;

/// Quality and profile score of one side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualitySnapshot {
    pub quality: QualityModel,
    pub format_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotUpgradeReason {
    LowerQuality,
    LowerRevision,
    /// Higher revision found, but the policy keeps propers from replacing files.
    RevisionUpgradesDisabled,
    /// Quality and revision tie and the format score is not strictly greater.
    FormatScoreNotHigher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeVerdict {
    Upgrade,
    NotUpgrade(NotUpgradeReason),
}

impl UpgradeVerdict {
    pub fn is_upgrade(&self) -> bool {
        matches!(self, UpgradeVerdict::Upgrade)
    }
}

pub fn compare_for_upgrade(
    profile: &QualityProfile,
    policy: ProperDownloadTypes,
    existing: Option<&QualitySnapshot>,
    candidate: &QualitySnapshot,
) -> UpgradeVerdict {
    let Some(existing) = existing else {
        return UpgradeVerdict::Upgrade;
    };

    match profile.compare_quality(candidate.quality.quality, existing.quality.quality) {
        Ordering::Greater => return UpgradeVerdict::Upgrade,
        Ordering::Less => return UpgradeVerdict::NotUpgrade(NotUpgradeReason::LowerQuality),
        Ordering::Equal => {}
    }

    if policy != ProperDownloadTypes::DoNotPrefer {
        match candidate
            .quality
            .revision
            .compare(&existing.quality.revision)
        {
            Ordering::Greater if policy == ProperDownloadTypes::PreferAndUpgrade => {
                return UpgradeVerdict::Upgrade;
            }
            Ordering::Greater => {
                return UpgradeVerdict::NotUpgrade(NotUpgradeReason::RevisionUpgradesDisabled);
            }
            Ordering::Less => {
                return UpgradeVerdict::NotUpgrade(NotUpgradeReason::LowerRevision);
            }
            Ordering::Equal => {}
        }
    }

    if candidate.format_score > existing.format_score {
        UpgradeVerdict::Upgrade
    } else {
        UpgradeVerdict::NotUpgrade(NotUpgradeReason::FormatScoreNotHigher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quality::models::{Quality, Revision};

    fn snapshot(quality: Quality, version: u32, score: i32) -> QualitySnapshot {
        QualitySnapshot {
            quality: QualityModel::with_revision(quality, version),
            format_score: score,
        }
    }

    fn verdict(
        policy: ProperDownloadTypes,
        existing: QualitySnapshot,
        candidate: QualitySnapshot,
    ) -> UpgradeVerdict {
        compare_for_upgrade(
            &QualityProfile::default(),
            policy,
            Some(&existing),
            &candidate,
        )
    }

    #[test]
    fn test_no_existing_file_is_always_upgrade() {
        let profile = QualityProfile::default();
        for q in Quality::ALL {
            for policy in [
                ProperDownloadTypes::PreferAndUpgrade,
                ProperDownloadTypes::DoNotUpgrade,
                ProperDownloadTypes::DoNotPrefer,
            ] {
                let candidate = snapshot(q, 1, -100);
                assert_eq!(
                    compare_for_upgrade(&profile, policy, None, &candidate),
                    UpgradeVerdict::Upgrade
                );
            }
        }
    }

    #[test]
    fn test_identical_on_every_axis_is_not_upgrade() {
        for q in Quality::ALL {
            for version in 1..=3 {
                for policy in [
                    ProperDownloadTypes::PreferAndUpgrade,
                    ProperDownloadTypes::DoNotUpgrade,
                    ProperDownloadTypes::DoNotPrefer,
                ] {
                    let side = snapshot(q, version, 15);
                    assert!(!verdict(policy, side, side).is_upgrade());
                }
            }
        }
    }

    #[test]
    fn test_higher_quality_wins_despite_lower_score() {
        let existing = snapshot(Quality::Scene, 1, 500);
        let candidate = snapshot(Quality::GOG, 1, -500);
        assert_eq!(
            verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate),
            UpgradeVerdict::Upgrade
        );
    }

    #[test]
    fn test_lower_quality_is_rejected() {
        let existing = snapshot(Quality::GOG, 1, 0);
        let candidate = snapshot(Quality::Scene, 2, 100);
        assert_eq!(
            verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate),
            UpgradeVerdict::NotUpgrade(NotUpgradeReason::LowerQuality)
        );
    }

    #[test]
    fn test_proper_upgrades_under_prefer_and_upgrade() {
        let existing = snapshot(Quality::Scene, 1, 10);
        let candidate = snapshot(Quality::Scene, 2, 0);
        assert_eq!(
            verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate),
            UpgradeVerdict::Upgrade
        );
        assert_eq!(
            verdict(ProperDownloadTypes::DoNotUpgrade, existing, candidate),
            UpgradeVerdict::NotUpgrade(NotUpgradeReason::RevisionUpgradesDisabled)
        );
    }

    #[test]
    fn test_do_not_prefer_lets_score_decide() {
        let existing = snapshot(Quality::Scene, 2, 0);
        let candidate = snapshot(Quality::Scene, 1, 10);
        assert_eq!(
            verdict(ProperDownloadTypes::DoNotPrefer, existing, candidate),
            UpgradeVerdict::Upgrade
        );
        assert_eq!(
            verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate),
            UpgradeVerdict::NotUpgrade(NotUpgradeReason::LowerRevision)
        );
    }

    #[test]
    fn test_real_counts_as_higher_revision() {
        let existing = snapshot(Quality::Repack, 1, 0);
        let candidate = QualitySnapshot {
            quality: QualityModel {
                quality: Quality::Repack,
                revision: Revision {
                    version: 1,
                    real: 1,
                    is_repack: false,
                },
            },
            format_score: 0,
        };
        assert!(verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate).is_upgrade());
    }

    #[test]
    fn test_equal_quality_higher_score_upgrades() {
        let existing = snapshot(Quality::Repack, 1, 5);
        let candidate = snapshot(Quality::Repack, 1, 6);
        assert!(verdict(ProperDownloadTypes::PreferAndUpgrade, existing, candidate).is_upgrade());
    }
}
