use super::{ImportSpecification, SpecDecision};
use crate::types::{Candidate, DownloadHandle, RejectionReason};

/// Rejects video files whose probe reports zero audio streams.
pub struct HasAudioTrackSpecification;

impl ImportSpecification for HasAudioTrackSpecification {
    fn name(&self) -> &'static str {
        "HasAudioTrack"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        _download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        let streams = candidate
            .media_info
            .as_ref()
            .and_then(|info| info.audio_stream_count);

        match streams {
            Some(0) => Ok(SpecDecision::reject(
                RejectionReason::NoAudioTrack,
                "No audio tracks detected",
            )),
            _ => Ok(SpecDecision::Accept),
        }
    }
}
