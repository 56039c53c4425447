use super::{ImportSpecification, SpecDecision};
use crate::services::import::ports::HistoryProvider;
use crate::types::{Candidate, DownloadHandle, HistoryEventKind, RejectionReason};
use std::sync::Arc;

/// Rejects a download whose title was already imported after its latest grab.
/// Only the most recent grab and the most recent import are compared.
pub struct AlreadyImportedSpecification {
    history: Arc<dyn HistoryProvider>,
}

impl AlreadyImportedSpecification {
    pub fn new(history: Arc<dyn HistoryProvider>) -> Self {
        Self { history }
    }
}

impl ImportSpecification for AlreadyImportedSpecification {
    fn name(&self) -> &'static str {
        "AlreadyImported"
    }

    fn evaluate(
        &self,
        candidate: &Candidate,
        download: Option<&DownloadHandle>,
    ) -> anyhow::Result<SpecDecision> {
        if download.is_none() {
            return Ok(SpecDecision::Accept);
        }

        let title = candidate.title()?;
        if !title.has_file() {
            log::debug!("Skipping already imported check for title without file");
            return Ok(SpecDecision::Accept);
        }

        let events = self.history.events_for_title(title.id)?;
        let latest = |kind: HistoryEventKind| {
            events
                .iter()
                .filter(|e| e.kind == kind)
                .max_by_key(|e| e.date)
        };

        let Some(last_imported) = latest(HistoryEventKind::Imported) else {
            return Ok(SpecDecision::Accept);
        };

        if let Some(last_grabbed) = latest(HistoryEventKind::Grabbed) {
            if last_grabbed.date > last_imported.date {
                return Ok(SpecDecision::Accept);
            }
        }

        log::debug!(
            "'{}' was imported at {} after its latest grab",
            title.name,
            last_imported.date
        );
        Ok(SpecDecision::reject(
            RejectionReason::AlreadyImported,
            format!("Game file already imported at {}", last_imported.date.to_rfc3339()),
        ))
    }
}
