//! Error types for the edgequake-refextract library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`RefExtractError`]: **Fatal.** The run cannot proceed at all (missing
//!   query, no staged text to work from, a pipeline directory that cannot be
//!   created or cleared). Returned as `Err(RefExtractError)` from
//!   [`crate::run::run`].
//!
//! * [`DocumentError`]: **Non-fatal.** One Document failed to convert or
//!   extract. Recorded in [`crate::output::DocumentOutcome`]; the remaining
//!   Documents are still processed.
//!
//! * [`LlmError`]: what the language-model collaborator may answer instead
//!   of text. Wrapped into [`DocumentError::Model`] at the file boundary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-refextract library.
#[derive(Debug, Error)]
pub enum RefExtractError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The free-text query was absent or blank.
    #[error("A query is required, e.g. refextract \"Extract the references cited in Related Work\"")]
    MissingQuery,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Conversion was skipped and the staging directory holds no text files.
    #[error("No staged text files found in '{dir}'\nRun without --no-convert to convert PDFs first.")]
    NoStagedText { dir: PathBuf },

    // ── Directory errors ──────────────────────────────────────────────────
    /// A pipeline directory could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A staging or templates directory could not be emptied.
    #[error("Failed to clear '{path}': {source}")]
    DirectoryClear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be listed.
    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumUnavailable(String),
}

/// A non-fatal error for a single Document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The file has a `.pdf` name but not a PDF header.
    #[error("not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The file could not be opened or read.
    #[error("cannot read file: {detail}")]
    Unreadable { detail: String },

    /// The PDF is password protected.
    #[error("PDF is encrypted and requires a password")]
    Encrypted,

    /// The PDF structure could not be parsed.
    #[error("PDF is corrupt: {detail}")]
    Corrupt { detail: String },

    /// Every page came back empty, typically a scanned, image-only PDF.
    #[error("no extractable text in {pages} page(s); the PDF may be image-only")]
    NoExtractableText { pages: usize },

    /// An earlier input PDF already produces the same artifact names,
    /// e.g. `a.pdf` next to `a.PDF`.
    #[error("another input PDF already maps to this name: '{existing}'")]
    DuplicateName { existing: PathBuf },

    /// A staged text file could not be read back.
    #[error("cannot read staged text '{path}': {detail}")]
    ReadStaged { path: PathBuf, detail: String },

    /// An artifact could not be written.
    #[error("cannot write '{path}': {detail}")]
    WriteArtifact { path: PathBuf, detail: String },

    /// The language model did not produce an answer.
    #[error(transparent)]
    Model(#[from] LlmError),
}

/// Failure answers from the language-model collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LlmError {
    /// Model not installed, runtime unreachable, or the request was rejected.
    #[error("model '{model}' unavailable: {detail}")]
    Unavailable { model: String, detail: String },

    /// The model answered with nothing but whitespace.
    #[error("model '{model}' returned an empty response")]
    EmptyResponse { model: String },
}
