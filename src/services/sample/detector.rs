//! Sample vs full-content classification from actual and expected runtime.

use crate::services::import::ports::MediaInfoReader;
use crate::services::scanner::walker;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Formats that never carry an embedded runtime: streaming pointers and disc images.
pub const NO_PROBE_EXTENSIONS: &[&str] = &["flv", "strm", "iso", "img", "m2ts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleClassification {
    Sample,
    NotSample,
    Indeterminate,
}

/// Expected-runtime band with its own minimum runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeBand {
    pub name: &'static str,
    /// Upper bound of expected runtime for this band, inclusive. `None` = unbounded.
    pub max_expected_minutes: Option<u32>,
    pub minimum_runtime: Duration,
}

pub const SHORT_BAND: RuntimeBand = RuntimeBand {
    name: "short",
    max_expected_minutes: Some(3),
    minimum_runtime: Duration::from_secs(15),
};

pub const MEDIUM_BAND: RuntimeBand = RuntimeBand {
    name: "medium",
    max_expected_minutes: Some(10),
    minimum_runtime: Duration::from_secs(90),
};

pub const EPISODE_BAND: RuntimeBand = RuntimeBand {
    name: "episode",
    max_expected_minutes: Some(30),
    minimum_runtime: Duration::from_secs(300),
};

pub const FEATURE_BAND: RuntimeBand = RuntimeBand {
    name: "feature",
    max_expected_minutes: None,
    minimum_runtime: Duration::from_secs(600),
};

/// Bands ordered by expected runtime.
pub const RUNTIME_BANDS: &[RuntimeBand] = &[SHORT_BAND, MEDIUM_BAND, EPISODE_BAND, FEATURE_BAND];

pub fn band_for(expected_runtime_minutes: u32) -> RuntimeBand {
    RUNTIME_BANDS
        .iter()
        .copied()
        .find(|band| match band.max_expected_minutes {
            Some(max) => expected_runtime_minutes <= max,
            None => true,
        })
        .unwrap_or(FEATURE_BAND)
}

/// Pure threshold check.
pub fn classify_runtime(expected_runtime_minutes: u32, runtime: Duration) -> SampleClassification {
    if runtime < band_for(expected_runtime_minutes).minimum_runtime {
        SampleClassification::Sample
    } else {
        SampleClassification::NotSample
    }
}

#[derive(Clone)]
pub struct SampleDetector {
    media_info: Arc<dyn MediaInfoReader>,
}

impl SampleDetector {
    pub fn new(media_info: Arc<dyn MediaInfoReader>) -> Self {
        Self { media_info }
    }

    pub fn classify(&self, expected_runtime_minutes: u32, path: &Path) -> SampleClassification {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if NO_PROBE_EXTENSIONS.contains(&ext.as_str()) || !walker::is_video_file(path) {
            log::debug!("Skipping sample check for {}", path.display());
            return SampleClassification::NotSample;
        }

        if expected_runtime_minutes == 0 {
            log::warn!(
                "Expected runtime unknown, cannot check {} for sample",
                path.display()
            );
            return SampleClassification::Indeterminate;
        }

        let runtime = match self.media_info.read_runtime(path) {
            Ok(Some(runtime)) => runtime,
            Ok(None) => {
                log::error!(
                    "Failed to get runtime from the file, make sure media info is available: {}",
                    path.display()
                );
                return SampleClassification::Indeterminate;
            }
            Err(e) => {
                log::error!("Failed to read runtime of {}: {e:#}", path.display());
                return SampleClassification::Indeterminate;
            }
        };

        let classification = classify_runtime(expected_runtime_minutes, runtime);
        log::debug!(
            "{} runtime {:?} vs expected {}m: {:?}",
            path.display(),
            runtime,
            expected_runtime_minutes,
            classification
        );
        classification
    }
}
