//! Progress-callback trait for per-Document pipeline events.
//!
//! Pass a `&dyn PipelineProgress` to [`crate::run::run`] to receive
//! events as each stage handles each Document. The CLI renders them as a
//! progress bar; library users can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_refextract::{DocumentKey, PipelineProgress, Stage};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingProgress {
//!     failed: AtomicUsize,
//! }
//!
//! impl PipelineProgress for CountingProgress {
//!     fn on_document_error(&self, stage: Stage, key: &DocumentKey, _index: usize, _total: usize, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage}: {key} failed: {error}");
//!     }
//! }
//! ```

use crate::document::DocumentKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Pipeline stage emitting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// PDF → staged text.
    Convert,
    /// Staged text → model answer.
    Extract,
    /// Staged text → manual scaffold.
    Template,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Convert => "convert",
            Stage::Extract => "extract",
            Stage::Template => "template",
        })
    }
}

/// Called by the pipeline as it processes each Document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait PipelineProgress: Send + Sync {
    /// Called once before the first Document of a stage.
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let _ = (stage, total);
    }

    /// Called before a Document is handled.
    fn on_document_start(&self, stage: Stage, key: &DocumentKey, index: usize, total: usize) {
        let _ = (stage, key, index, total);
    }

    /// Called when a Document produced its artifact.
    fn on_document_complete(
        &self,
        stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        artifact: &Path,
    ) {
        let _ = (stage, key, index, total, artifact);
    }

    /// Called when a Document was skipped without an error.
    fn on_document_skipped(
        &self,
        stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        reason: &str,
    ) {
        let _ = (stage, key, index, total, reason);
    }

    /// Called when a Document failed.
    fn on_document_error(
        &self,
        stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        error: &str,
    ) {
        let _ = (stage, key, index, total, error);
    }

    /// Called once after every Document of a stage was attempted.
    fn on_stage_complete(&self, stage: Stage, total: usize, success_count: usize) {
        let _ = (stage, total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingProgress {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        skips: AtomicUsize,
    }

    impl PipelineProgress for TrackingProgress {
        fn on_document_start(&self, _: Stage, _: &DocumentKey, _: usize, _: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _: Stage, _: &DocumentKey, _: usize, _: usize, _: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_skipped(&self, _: Stage, _: &DocumentKey, _: usize, _: usize, _: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _: Stage, _: &DocumentKey, _: usize, _: usize, _: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_progress_does_not_panic() {
        let key = DocumentKey::new("a");
        let cb = NoopProgress;
        cb.on_stage_start(Stage::Convert, 2);
        cb.on_document_start(Stage::Convert, &key, 1, 2);
        cb.on_document_complete(Stage::Convert, &key, 1, 2, Path::new("tmp/txts/a.txt"));
        cb.on_document_skipped(Stage::Extract, &key, 1, 2, "empty");
        cb.on_document_error(Stage::Extract, &key, 2, 2, "boom");
        cb.on_stage_complete(Stage::Extract, 2, 1);
    }

    #[test]
    fn tracking_counts_through_a_trait_object() {
        let key = DocumentKey::new("a");
        let t = TrackingProgress::default();
        let cb: &dyn PipelineProgress = &t;
        cb.on_document_start(Stage::Extract, &key, 1, 3);
        cb.on_document_complete(Stage::Extract, &key, 1, 3, Path::new("x"));
        cb.on_document_start(Stage::Extract, &key, 2, 3);
        cb.on_document_error(Stage::Extract, &key, 2, 3, "unavailable");
        cb.on_document_start(Stage::Extract, &key, 3, 3);
        cb.on_document_skipped(Stage::Extract, &key, 3, 3, "empty");
        assert_eq!(t.starts.load(Ordering::SeqCst), 3);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
        assert_eq!(t.skips.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Convert.to_string(), "convert");
        assert_eq!(Stage::Template.to_string(), "template");
    }
}
