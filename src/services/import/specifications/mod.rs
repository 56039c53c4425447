//! Ordered accept/reject rules run against every import candidate.

pub mod already_imported;
pub mod free_space;
pub mod has_audio_track;
pub mod matches_grab;
pub mod not_sample;
pub mod upgrade;

pub use already_imported::AlreadyImportedSpecification;
pub use free_space::FreeSpaceSpecification;
pub use has_audio_track::HasAudioTrackSpecification;
pub use matches_grab::MatchesGrabSpecification;
pub use not_sample::NotSampleSpecification;
pub use upgrade::UpgradeSpecification;

use super::ports::{HistoryProvider, MediaInfoReader};
use crate::services::config::ImportSettings;
use crate::services::fs_utils::DiskProvider;
use crate::services::sample::SampleDetector;
use crate::types::{Candidate, DownloadHandle, Rejection, RejectionReason};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecDecision {
    Accept,
    Reject(Rejection),
}

impl SpecDecision {
    pub fn reject(reason: RejectionReason, message: impl Into<String>) -> Self {
        SpecDecision::Reject(Rejection::new(reason, message))
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SpecDecision::Accept)
    }
}

/// One rule of the decision chain. An `Err` is turned into a rejection by
/// the decision maker; it never stops the other rules.
pub trait ImportSpecification: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        candidate: &Candidate,
        download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision>;
}

/// The standard chain, in evaluation order.
pub fn default_specifications(
    disk: Arc<dyn DiskProvider>,
    history: Arc<dyn HistoryProvider>,
    media_info: Arc<dyn MediaInfoReader>,
    settings: &ImportSettings,
) -> Vec<Box<dyn ImportSpecification>> {
    vec![
        Box::new(FreeSpaceSpecification::new(
            disk,
            settings.minimum_free_space_bytes(),
            settings.skip_free_space_check,
        )),
        Box::new(NotSampleSpecification::new(SampleDetector::new(media_info))),
        Box::new(HasAudioTrackSpecification),
        Box::new(MatchesGrabSpecification::new(history.clone())),
        Box::new(AlreadyImportedSpecification::new(history)),
        Box::new(UpgradeSpecification::new(settings.proper_download_types)),
    ]
}
