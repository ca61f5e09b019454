//! # edgequake-refextract
//!
//! Pull the references cited in one section of an academic paper out of a
//! folder of PDFs, using a local language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! inputs/*.pdf
//!  │
//!  ├─ 0. Clear     empty tmp/txts and tmp/extraction_templates
//!  ├─ 1. Convert   pdfium text extraction → tmp/txts/<base>.txt (page markers)
//!  └─ 2. Extract   query + full text → model → outputs/<base>_references.txt
//!                  or, without a model,  → tmp/extraction_templates/<base>_template.py
//! ```
//!
//! Every step is optional. Documents are processed one at a time; a paper
//! that fails to convert or extract is reported and the run moves on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_refextract::{run, NoopProgress, PdfiumExtractor, ProviderModel, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .query("Extract the references cited in the Related Work section")
//!         .model("ministral-3")
//!         .build()?;
//!
//!     let extractor = PdfiumExtractor::bind(None)?;
//!     let model = ProviderModel::from_config(&config);
//!     let summary = run(&config, Some(&extractor), &model, &NoopProgress).await?;
//!
//!     for outcome in summary.extraction.iter().flat_map(|r| r.processed()) {
//!         println!("{} → {:?}", outcome.key, outcome.artifact());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `refextract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `bundled` | off     | Embeds the pdfium shared library in the binary |
//!
//! ## Models
//!
//! The default provider is a local Ollama runtime with `ministral-3`
//! (`ollama pull ministral-3`). Any provider known to `edgequake-llm`
//! can be selected by name, e.g. `anthropic` with `ANTHROPIC_API_KEY` set.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionMode, ExtractionRequest, RunConfig, RunConfigBuilder, Workspace};
pub use convert::convert_all;
pub use document::{Document, DocumentKey, StagedFile, StagedText};
pub use error::{DocumentError, LlmError, RefExtractError};
pub use extract::extract_all;
pub use output::{DocumentOutcome, OutcomeStatus, RunSummary, StageReport};
pub use pipeline::llm::{LanguageModel, ProviderModel};
pub use pipeline::text::{PdfiumExtractor, TextExtractor};
pub use progress::{NoopProgress, PipelineProgress, Stage};
pub use run::run;
