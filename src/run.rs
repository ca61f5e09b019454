//! Orchestrator: clear → convert → extract, driven by one [`RunConfig`].

use crate::config::RunConfig;
use crate::convert::convert_all;
use crate::error::RefExtractError;
use crate::extract::extract_all;
use crate::output::RunSummary;
use crate::pipeline::llm::LanguageModel;
use crate::pipeline::text::TextExtractor;
use crate::pipeline::{input, store};
use crate::progress::PipelineProgress;
use std::time::Instant;
use tracing::{info, warn};

/// Run the whole pipeline once.
///
/// `extractor` is only consulted when `config.convert` is set and may be
/// `None` otherwise. `model` is only called in [`crate::ExtractionMode::Llm`].
///
/// # Errors
/// Run-level preconditions only: no staged text with conversion disabled,
/// a directory that cannot be listed, created or cleared, or a missing
/// extractor when conversion is enabled. Failures of individual Documents
/// are reported in the returned [`RunSummary`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_refextract::{run, NoopProgress, PdfiumExtractor, ProviderModel, RunConfig};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RunConfig::builder()
///     .query("Extract the references cited in the Introduction")
///     .build()?;
/// let extractor = PdfiumExtractor::bind(None)?;
/// let model = ProviderModel::from_config(&config);
/// let summary = run(&config, Some(&extractor), &model, &NoopProgress).await?;
/// println!("{} failed", summary.failed_count());
/// # Ok(())
/// # }
/// ```
pub async fn run(
    config: &RunConfig,
    extractor: Option<&dyn TextExtractor>,
    model: &dyn LanguageModel,
    progress: &dyn PipelineProgress,
) -> Result<RunSummary, RefExtractError> {
    let start = Instant::now();
    let ws = &config.workspace;
    let mut summary = RunSummary {
        mode: config.mode,
        ..Default::default()
    };

    if config.clear {
        if !config.convert {
            warn!(
                "Clearing {} with conversion disabled; no staged text will remain",
                ws.staging_dir.display()
            );
        }
        for dir in ws.clearable_dirs() {
            let removed = store::clear_dir(dir)?;
            info!("Cleared {} ({} entries)", dir.display(), removed);
            summary.cleared += removed;
        }
    }

    if config.convert {
        let extractor = extractor.ok_or_else(|| {
            RefExtractError::PdfiumUnavailable("no text extractor supplied".into())
        })?;
        let report = convert_all(ws, extractor, progress)?;
        let found = report.total();
        summary.conversion = Some(report);

        if found == 0 {
            summary
                .warnings
                .push(format!("No PDF files found in {}", ws.input_dir.display()));
            summary.total_duration_ms = start.elapsed().as_millis() as u64;
            return Ok(summary);
        }
    } else {
        info!("Skipping PDF conversion");
    }

    let staged = input::discover_staged(&ws.staging_dir)?;
    if staged.is_empty() {
        if !config.convert {
            return Err(RefExtractError::NoStagedText {
                dir: ws.staging_dir.clone(),
            });
        }
        let msg = format!(
            "No staged text in {}; skipping extraction",
            ws.staging_dir.display()
        );
        warn!("{}", msg);
        summary.warnings.push(msg);
    } else {
        summary.extraction = Some(extract_all(config, model, progress).await?);
    }

    summary.total_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Run finished in {}ms, {} failure(s)",
        summary.total_duration_ms,
        summary.failed_count()
    );
    Ok(summary)
}
