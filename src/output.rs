//! Per-Document outcomes and the run summary.

use crate::config::ExtractionMode;
use crate::document::DocumentKey;
use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one Document in one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The stage wrote its artifact.
    Processed { artifact: PathBuf },
    /// Nothing to do for this Document; no artifact, no error.
    Skipped { reason: String },
    /// The stage failed for this Document; no artifact was written.
    Failed { error: DocumentError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub key: DocumentKey,
    /// The file the stage read: a PDF or a staged text file.
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl DocumentOutcome {
    pub fn processed(key: DocumentKey, source: PathBuf, artifact: PathBuf) -> Self {
        Self {
            key,
            source,
            status: OutcomeStatus::Processed { artifact },
        }
    }

    pub fn skipped(key: DocumentKey, source: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            key,
            source,
            status: OutcomeStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(key: DocumentKey, source: PathBuf, error: DocumentError) -> Self {
        Self {
            key,
            source,
            status: OutcomeStatus::Failed { error },
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Processed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    pub fn artifact(&self) -> Option<&PathBuf> {
        match &self.status {
            OutcomeStatus::Processed { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DocumentError> {
        match &self.status {
            OutcomeStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Result of one stage over all its Documents, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl StageReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn processed(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.is_processed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn processed_count(&self) -> usize {
        self.processed().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}

/// Everything a run did, for the console summary or `--json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Entries removed by the clear step.
    pub cleared: usize,
    /// `None` when conversion was disabled.
    pub conversion: Option<StageReport>,
    /// `None` when the run stopped before extraction.
    pub extraction: Option<StageReport>,
    pub mode: ExtractionMode,
    /// Non-fatal run-level notices, e.g. an empty input directory.
    pub warnings: Vec<String>,
    pub total_duration_ms: u64,
}

impl RunSummary {
    /// Documents that failed in any stage.
    pub fn failed_count(&self) -> usize {
        self.conversion.as_ref().map_or(0, StageReport::failed_count)
            + self.extraction.as_ref().map_or(0, StageReport::failed_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> StageReport {
        StageReport {
            outcomes: vec![
                DocumentOutcome::processed(
                    DocumentKey::new("a"),
                    "inputs/a.pdf".into(),
                    "tmp/txts/a.txt".into(),
                ),
                DocumentOutcome::failed(
                    DocumentKey::new("b"),
                    "inputs/b.pdf".into(),
                    DocumentError::Encrypted,
                ),
                DocumentOutcome::skipped(DocumentKey::new("c"), "tmp/txts/c.txt".into(), "empty"),
            ],
        }
    }

    #[test]
    fn counts() {
        let r = report();
        assert_eq!(r.total(), 3);
        assert_eq!(r.processed_count(), 1);
        assert_eq!(r.failed_count(), 1);
        assert_eq!(r.skipped_count(), 1);
    }

    #[test]
    fn accessors() {
        let r = report();
        assert_eq!(
            r.outcomes[0].artifact(),
            Some(&PathBuf::from("tmp/txts/a.txt"))
        );
        assert!(r.outcomes[1].error().is_some());
        assert!(r.outcomes[2].artifact().is_none());
    }

    #[test]
    fn summary_failed_count_spans_stages() {
        let s = RunSummary {
            conversion: Some(report()),
            extraction: Some(report()),
            ..Default::default()
        };
        assert_eq!(s.failed_count(), 2);
    }

    #[test]
    fn outcome_serialises_flat() {
        let json = serde_json::to_value(&report().outcomes[0]).unwrap();
        assert_eq!(json["key"], "a");
        assert_eq!(json["status"], "processed");
        assert_eq!(json["artifact"], "tmp/txts/a.txt");
    }
}
