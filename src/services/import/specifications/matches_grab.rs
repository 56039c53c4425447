//! Keeps concurrent grabs for one title from satisfying each other.

use super::{ImportSpecification, SpecDecision};
use crate::services::import::ports::HistoryProvider;
use crate::services::parser::{group_key, parse_release_name, ParsedReleaseInfo};
use crate::types::{Candidate, DownloadHandle, HistoryEvent, HistoryEventKind, RejectionReason};
use std::collections::HashSet;
use std::sync::Arc;

const TITLE_SIMILARITY: f64 = 0.9;

pub struct MatchesGrabSpecification {
    history: Arc<dyn HistoryProvider>,
}

impl MatchesGrabSpecification {
    pub fn new(history: Arc<dyn HistoryProvider>) -> Self {
        Self { history }
    }
}

/// Grabs newer than the latest import, oldest first.
fn pending_grabs(events: &[HistoryEvent]) -> Vec<&HistoryEvent> {
    let last_import = events
        .iter()
        .filter(|e| e.kind == HistoryEventKind::Imported)
        .map(|e| e.date)
        .max();

    events
        .iter()
        .filter(|e| e.kind == HistoryEventKind::Grabbed)
        .filter(|e| last_import.map(|d| e.date > d).unwrap_or(true))
        .collect()
}

fn same_release(parsed: &ParsedReleaseInfo, grabbed: &ParsedReleaseInfo) -> bool {
    let similarity = strsim::normalized_levenshtein(&parsed.clean_title, &grabbed.clean_title);
    let title_match = similarity >= TITLE_SIMILARITY;

    let group_match = match (&parsed.release_group, &grabbed.release_group) {
        (Some(a), Some(b)) => group_key(a) == group_key(b),
        _ => true,
    };

    title_match && group_match
}

impl ImportSpecification for MatchesGrabSpecification {
    fn name(&self) -> &'static str {
        "MatchesGrab"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        if candidate.existing_file {
            return Ok(SpecDecision::Accept);
        }
        let Some(download) = download else {
            return Ok(SpecDecision::Accept);
        };

        let title = candidate.title()?;
        let events = self.history.events_for_title(title.id)?;
        let grabs = pending_grabs(&events);

        let concurrent: HashSet<&str> = grabs
            .iter()
            .filter_map(|e| e.download_id.as_deref())
            .collect();
        if concurrent.len() < 2 {
            return Ok(SpecDecision::Accept);
        }

        let Some(grab) = grabs
            .iter()
            .rev()
            .find(|e| e.download_id.as_deref() == Some(download.download_id.as_str()))
        else {
            return Ok(SpecDecision::Accept);
        };

        let Some(parsed) = candidate
            .folder_info
            .as_ref()
            .or(candidate.file_info.as_ref())
        else {
            return Ok(SpecDecision::Accept);
        };
        let Some(grabbed) = parse_release_name(&grab.source_title) else {
            log::debug!("Unable to parse grabbed release '{}'", grab.source_title);
            return Ok(SpecDecision::Accept);
        };

        if same_release(parsed, &grabbed) {
            return Ok(SpecDecision::Accept);
        }

        log::debug!(
            "'{}' does not match grab '{}' among {} concurrent grabs",
            parsed.release_title,
            grab.source_title,
            concurrent.len()
        );
        Ok(SpecDecision::reject(
            RejectionReason::GrabMismatch,
            format!(
                "Release '{}' does not match grabbed release '{}'",
                parsed.release_title, grab.source_title
            ),
        ))
    }
}
