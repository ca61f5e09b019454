//! Prompt/Output Builder stage: every staged text → one extraction result.
//!
//! In [`ExtractionMode::Llm`] the staged text and the query are sent to the
//! language model and the raw answer is saved as `<base>_references.txt`.
//! In [`ExtractionMode::Template`] no model is called; a fill-in scaffold is
//! saved as `<base>_template.py` instead. Exactly one of the two runs per
//! invocation.

use crate::config::{ExtractionMode, RunConfig};
use crate::document::{StagedFile, StagedText};
use crate::error::{DocumentError, RefExtractError};
use crate::output::{DocumentOutcome, OutcomeStatus, StageReport};
use crate::pipeline::llm::LanguageModel;
use crate::pipeline::{input, store, template};
use crate::progress::{PipelineProgress, Stage};
use crate::prompts::build_extraction_prompt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Process every staged text file of `config.workspace.staging_dir`.
///
/// # Returns
/// One outcome per staged file, in file-name order. An empty report means
/// there was nothing staged.
///
/// # Errors
/// Only when the staging directory cannot be listed or the target directory
/// cannot be created. Per-file failures are recorded in the report.
pub async fn extract_all(
    config: &RunConfig,
    model: &dyn LanguageModel,
    progress: &dyn PipelineProgress,
) -> Result<StageReport, RefExtractError> {
    let ws = &config.workspace;
    let staged = input::discover_staged(&ws.staging_dir)?;
    if staged.is_empty() {
        warn!("No staged text files in {}", ws.staging_dir.display());
        return Ok(StageReport::default());
    }

    let (stage, target_dir) = match config.mode {
        ExtractionMode::Llm => (Stage::Extract, &ws.output_dir),
        ExtractionMode::Template => (Stage::Template, &ws.templates_dir),
    };
    store::ensure_dir(target_dir)?;

    let total = staged.len();
    info!(
        "Reference extraction from {} paper(s), mode {:?}, model {}",
        total, config.mode, config.request.model
    );
    progress.on_stage_start(stage, total);

    let mut report = StageReport::default();
    for (i, file) in staged.into_iter().enumerate() {
        let index = i + 1;
        progress.on_document_start(stage, &file.key, index, total);

        let outcome = extract_document(config, &file, model).await;
        match &outcome.status {
            OutcomeStatus::Processed { artifact } => {
                progress.on_document_complete(stage, &file.key, index, total, artifact)
            }
            OutcomeStatus::Skipped { reason } => {
                progress.on_document_skipped(stage, &file.key, index, total, reason)
            }
            OutcomeStatus::Failed { error } => {
                progress.on_document_error(stage, &file.key, index, total, &error.to_string())
            }
        }
        report.outcomes.push(outcome);
    }

    let produced = report.processed_count();
    info!("Extraction complete: {}/{} results written", produced, total);
    progress.on_stage_complete(stage, total, produced);

    Ok(report)
}

/// Produce the extraction result for one staged file.
///
/// Always returns an outcome, never an error, so one bad paper does not
/// abort the run.
pub async fn extract_document(
    config: &RunConfig,
    file: &StagedFile,
    model: &dyn LanguageModel,
) -> DocumentOutcome {
    let body = match std::fs::read_to_string(&file.path) {
        Ok(body) => body,
        Err(e) => {
            let err = DocumentError::ReadStaged {
                path: file.path.clone(),
                detail: e.to_string(),
            };
            warn!("{}: {}", file.key, err);
            return DocumentOutcome::failed(file.key.clone(), file.path.clone(), err);
        }
    };

    let result = match config.mode {
        ExtractionMode::Llm => {
            // Template mode scaffolds blank text too.
            if StagedText::parse(file.key.clone(), &body).is_blank() {
                debug!("{}: staged text is empty, skipping", file.key);
                return DocumentOutcome::skipped(
                    file.key.clone(),
                    file.path.clone(),
                    "staged text is empty",
                );
            }
            answer_with_model(config, file, &body, model).await
        }
        ExtractionMode::Template => write_scaffold(config, file, &body),
    };

    match result {
        Ok(artifact) => DocumentOutcome::processed(file.key.clone(), file.path.clone(), artifact),
        Err(e) => {
            warn!("Extraction failed for {}: {}", file.key, e);
            DocumentOutcome::failed(file.key.clone(), file.path.clone(), e)
        }
    }
}

async fn answer_with_model(
    config: &RunConfig,
    file: &StagedFile,
    body: &str,
    model: &dyn LanguageModel,
) -> Result<PathBuf, DocumentError> {
    let prompt = build_extraction_prompt(
        config.instructions.as_deref(),
        &config.request.query,
        body,
    );
    debug!("{}: prompt is {} chars", file.key, prompt.len());

    let start = Instant::now();
    let answer = model.generate(&config.request.model, &prompt).await?;
    debug!("{}: answered in {:?}", file.key, start.elapsed());

    let target = config.workspace.references_path(&file.key);
    store::write_artifact(&target, &answer)?;
    Ok(target)
}

fn write_scaffold(
    config: &RunConfig,
    file: &StagedFile,
    body: &str,
) -> Result<PathBuf, DocumentError> {
    let script = template::render_scaffold(&file.key, &config.request.query, body);
    let target = config.workspace.template_path(&file.key);
    store::write_artifact(&target, &script)?;
    Ok(target)
}
