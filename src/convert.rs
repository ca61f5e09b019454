//! Converter stage: every PDF in the input directory → one staged text file.
//!
//! Documents are handled one at a time in file-name order. A PDF that cannot
//! be read or parsed is recorded as failed and the loop moves on; only
//! directory-level problems abort the stage.

use crate::config::Workspace;
use crate::document::{Document, DocumentKey, StagedText};
use crate::error::{DocumentError, RefExtractError};
use crate::output::{DocumentOutcome, StageReport};
use crate::pipeline::{input, store, text::TextExtractor};
use crate::progress::{PipelineProgress, Stage};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Convert all PDFs of `workspace.input_dir` into `workspace.staging_dir`.
///
/// # Returns
/// One outcome per discovered PDF, in processing order. An empty report
/// means the input directory held no PDF.
///
/// # Errors
/// Only when the input directory cannot be listed or the staging directory
/// cannot be created.
pub fn convert_all(
    workspace: &Workspace,
    extractor: &dyn TextExtractor,
    progress: &dyn PipelineProgress,
) -> Result<StageReport, RefExtractError> {
    let documents = input::discover_pdfs(&workspace.input_dir)?;
    if documents.is_empty() {
        warn!("No PDF files found in {}", workspace.input_dir.display());
        return Ok(StageReport::default());
    }

    store::ensure_dir(&workspace.staging_dir)?;

    let total = documents.len();
    info!("Converting {} PDF(s) from {}", total, workspace.input_dir.display());
    progress.on_stage_start(Stage::Convert, total);

    let mut report = StageReport::default();
    let mut owners: HashMap<DocumentKey, PathBuf> = HashMap::with_capacity(total);
    for (i, doc) in documents.into_iter().enumerate() {
        let index = i + 1;
        progress.on_document_start(Stage::Convert, &doc.key, index, total);

        // The first file in name order owns the key and its artifacts.
        let converted = match owners.get(&doc.key) {
            Some(existing) => Err(DocumentError::DuplicateName {
                existing: existing.clone(),
            }),
            None => {
                owners.insert(doc.key.clone(), doc.path.clone());
                convert_document(&doc, workspace, extractor)
            }
        };

        let outcome = match converted {
            Ok((artifact, pages)) => {
                info!("Converted {} ({} pages)", doc.key, pages);
                progress.on_document_complete(Stage::Convert, &doc.key, index, total, &artifact);
                DocumentOutcome::processed(doc.key, doc.path, artifact)
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", doc.path.display(), e);
                progress.on_document_error(Stage::Convert, &doc.key, index, total, &e.to_string());
                DocumentOutcome::failed(doc.key, doc.path, e)
            }
        };
        report.outcomes.push(outcome);
    }

    let converted = report.processed_count();
    info!("Conversion complete: {}/{} files converted", converted, total);
    progress.on_stage_complete(Stage::Convert, total, converted);

    Ok(report)
}

/// Convert one PDF; returns the staged path and its page count.
pub fn convert_document(
    doc: &Document,
    workspace: &Workspace,
    extractor: &dyn TextExtractor,
) -> Result<(PathBuf, usize), DocumentError> {
    input::check_pdf_header(&doc.path)?;

    let pages = extractor.extract_pages(&doc.path)?;
    let staged = StagedText::new(doc.key.clone(), pages);
    if staged.is_blank() {
        return Err(DocumentError::NoExtractableText {
            pages: staged.page_count(),
        });
    }
    debug!("{}: {} pages extracted", doc.key, staged.page_count());

    let target = workspace.staged_path(&doc.key);
    store::write_artifact(&target, &staged.render())?;
    Ok((target, staged.page_count()))
}
