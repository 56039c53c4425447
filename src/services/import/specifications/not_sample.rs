use super::{ImportSpecification, SpecDecision};
use crate::services::sample::{SampleClassification, SampleDetector};
use crate::types::{Candidate, DownloadHandle, RejectionReason};

pub struct NotSampleSpecification {
    detector: SampleDetector,
}

impl NotSampleSpecification {
    pub fn new(detector: SampleDetector) -> Self {
        Self { detector }
    }
}

impl ImportSpecification for NotSampleSpecification {
    fn name(&self) -> &'static str {
        "NotSample"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        _download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        if candidate.is_folder || candidate.existing_file {
            return Ok(SpecDecision::Accept);
        }

        let title = candidate.title()?;
        match self.detector.classify(title.runtime_minutes, &candidate.path) {
            SampleClassification::Sample => {
                log::debug!("{} is a sample", candidate.path.display());
                Ok(SpecDecision::reject(RejectionReason::Sample, "Sample"))
            }
            SampleClassification::Indeterminate => {
                log::error!(
                    "Unable to determine if {} is a sample, accepting it",
                    candidate.path.display()
                );
                Ok(SpecDecision::Accept)
            }
            SampleClassification::NotSample => Ok(SpecDecision::Accept),
        }
    }
}
