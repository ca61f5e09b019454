//! CLI binary for edgequake-refextract.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! binds pdfium when conversion is on, and prints the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_refextract::{
    run, DocumentKey, ExtractionMode, NoopProgress, PdfiumExtractor, PipelineProgress,
    ProviderModel, RunConfig, RunSummary, Stage, StageReport, TextExtractor, Workspace,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One progress bar per stage, with a log line per Document printed above it.
struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn println(&self, line: String) {
        match self.bar.lock().ok().and_then(|b| b.clone()) {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn inc(&self) {
        if let Some(bar) = self.bar.lock().ok().and_then(|b| b.clone()) {
            bar.inc(1);
        }
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Convert => "Converting",
        Stage::Extract => "Extracting",
        Stage::Template => "Templating",
    }
}

fn short(error: &str) -> String {
    if error.chars().count() > 80 {
        let cut: String = error.chars().take(79).collect();
        format!("{cut}\u{2026}")
    } else {
        error.to_string()
    }
}

impl PipelineProgress for CliProgress {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} papers  {msg}  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix(stage_label(stage));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{} {total} paper(s)…", stage_label(stage)))
        ));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_document_start(&self, _stage: Stage, key: &DocumentKey, _index: usize, _total: usize) {
        if let Some(bar) = self.bar.lock().ok().and_then(|b| b.clone()) {
            bar.set_message(key.to_string());
        }
    }

    fn on_document_complete(
        &self,
        _stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        artifact: &Path,
    ) {
        self.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            green("✓"),
            index,
            total,
            key,
            dim(&format!("→ {}", artifact.display())),
        ));
        self.inc();
    }

    fn on_document_skipped(
        &self,
        _stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        reason: &str,
    ) {
        self.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            yellow("–"),
            index,
            total,
            key,
            dim(reason),
        ));
        self.inc();
    }

    fn on_document_error(
        &self,
        _stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        error: &str,
    ) {
        self.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            red("✗"),
            index,
            total,
            key,
            red(&short(error)),
        ));
        self.inc();
    }

    fn on_stage_complete(&self, stage: Stage, total: usize, success_count: usize) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut b| b.take()) {
            bar.finish_and_clear();
        }
        let failed = total.saturating_sub(success_count);
        let mark = if failed == 0 {
            green("✔")
        } else if success_count == 0 {
            red("✘")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {} {}/{} paper(s)",
            mark,
            stage,
            bold(&success_count.to_string()),
            total
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full run: convert inputs/*.pdf, ask the local model, write outputs/
  refextract "Extract the references cited in the Introduction"

  # Use another Ollama model
  refextract "Extract all references from Related Work" --model llama3.2

  # Reuse the text already in tmp/txts
  refextract "Extract references from Methods" --no-convert --no-clear

  # No model: write fill-in scaffolds to tmp/extraction_templates/
  refextract "Extract references from Methods" --no-extract

  # Hosted provider
  ANTHROPIC_API_KEY=... refextract "..." --provider anthropic --model claude-haiku-4-5

DIRECTORIES (relative to the working directory by default):
  inputs/                     PDFs to process (never modified)
  tmp/txts/                   one <name>.txt per PDF, page sections marked "--- page N ---"
  tmp/extraction_templates/   one <name>_template.py per paper (--no-extract)
  outputs/                    one <name>_references.txt per paper

  tmp/txts and tmp/extraction_templates are emptied first unless --no-clear.

ENVIRONMENT VARIABLES:
  REFEXTRACT_MODEL        Override model ID
  REFEXTRACT_PROVIDER     Override provider (ollama, anthropic, openai, gemini)
  ANTHROPIC_API_KEY       Anthropic API key
  OPENAI_API_KEY          OpenAI API key
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override log filtering

SETUP:
  1. Install Ollama and pull the default model:  ollama pull ministral-3
  2. Put PDFs in inputs/ and run refextract with a query.

  PDFium (~30 MB) is downloaded automatically on the first converting run
  and cached locally.
"#;

/// Extract cited references from academic PDFs with a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "refextract",
    version,
    about = "Extract cited references from academic PDFs with a local LLM",
    long_about = "Convert the PDFs in an input folder to page-marked text, then ask a language \
model (a local Ollama runtime by default) to list the references cited in the part of each \
paper named by QUERY. With --no-extract, write a fill-in Python scaffold per paper instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// What to extract, e.g. "Extract references from the Introduction".
    query: String,

    /// Model ID understood by the provider (default: ministral-3).
    #[arg(long, env = "REFEXTRACT_MODEL")]
    model: Option<String>,

    /// LLM provider: ollama, anthropic, openai, gemini.
    #[arg(long, env = "REFEXTRACT_PROVIDER", default_value = "ollama")]
    provider: String,

    /// Convert PDFs to text first (default).
    #[arg(long, overrides_with = "no_convert")]
    convert: bool,

    /// Use the staged text already in the staging directory.
    #[arg(long, overrides_with = "convert")]
    no_convert: bool,

    /// Ask the model for the references (default).
    #[arg(long, overrides_with = "no_extract")]
    extract: bool,

    /// Write a manual-extraction scaffold instead of calling the model.
    #[arg(long, overrides_with = "extract")]
    no_extract: bool,

    /// Empty the staging and templates directories first (default).
    #[arg(long, overrides_with = "no_clear")]
    clear: bool,

    /// Keep existing staged text and templates.
    #[arg(long, overrides_with = "clear")]
    no_clear: bool,

    /// Folder of PDFs to process.
    #[arg(long, env = "REFEXTRACT_INPUT_DIR", default_value = "inputs")]
    input_dir: PathBuf,

    /// Folder for the converted text files.
    #[arg(long, env = "REFEXTRACT_STAGING_DIR", default_value = "tmp/txts")]
    staging_dir: PathBuf,

    /// Folder for the manual-extraction scaffolds.
    #[arg(long, env = "REFEXTRACT_TEMPLATES_DIR", default_value = "tmp/extraction_templates")]
    templates_dir: PathBuf,

    /// Folder for the model answers.
    #[arg(long, env = "REFEXTRACT_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Text file replacing the built-in extraction instructions.
    #[arg(long, env = "REFEXTRACT_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "REFEXTRACT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per paper.
    #[arg(long, env = "REFEXTRACT_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "REFEXTRACT_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "REFEXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "REFEXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "REFEXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bars carry the per-paper feedback, so library INFO logs
    // are hidden while they are shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    if !cli.quiet && !cli.json {
        eprintln!("{} {}", cyan("◆"), bold("Reference extraction"));
        eprintln!("  Query:    {}", config.request.query);
        match config.mode {
            ExtractionMode::Llm => eprintln!(
                "  Model:    {} {}",
                config.request.model,
                dim(&format!("({})", config.provider_name))
            ),
            ExtractionMode::Template => eprintln!("  Mode:     manual template"),
        }
    }

    // ── Ensure PDFium engine is available (only when converting) ────────
    let extractor = if config.convert {
        Some(bind_pdfium(cli.quiet)?)
    } else {
        None
    };

    let model = ProviderModel::from_config(&config);
    let cli_progress = CliProgress::new();
    let progress: &dyn PipelineProgress = if show_progress {
        &cli_progress
    } else {
        &NoopProgress
    };

    let summary = run(
        &config,
        extractor.as_ref().map(|e| e as &dyn TextExtractor),
        &model,
        progress,
    )
    .await
    .context("Reference extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Bind pdfium, showing a download bar the first time the library is fetched.
fn bind_pdfium(quiet: bool) -> Result<PdfiumExtractor> {
    if quiet || pdfium_auto::is_pdfium_cached() {
        return tokio::task::block_in_place(|| PdfiumExtractor::bind(None))
            .context("Failed to load the PDFium engine");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let extractor = tokio::task::block_in_place(|| {
        PdfiumExtractor::bind(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download the PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(extractor)
}

/// Map CLI args to `RunConfig`.
async fn build_config(cli: &Cli) -> Result<RunConfig> {
    let instructions = if let Some(ref path) = cli.instructions {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read instructions from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = RunConfig::builder()
        .query(cli.query.clone())
        .model(cli.model.clone().unwrap_or_default())
        .provider_name(cli.provider.clone())
        .convert(cli.convert || !cli.no_convert)
        .extract(cli.extract || !cli.no_extract)
        .clear(cli.clear || !cli.no_clear)
        .workspace(Workspace {
            input_dir: cli.input_dir.clone(),
            staging_dir: cli.staging_dir.clone(),
            templates_dir: cli.templates_dir.clone(),
            output_dir: cli.output_dir.clone(),
        })
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);

    if let Some(text) = instructions {
        builder = builder.instructions(text);
    }

    builder.build().context("Invalid configuration")
}

/// Processed, skipped and failed papers by name, per stage.
fn print_summary(summary: &RunSummary) {
    eprintln!();
    for warning in &summary.warnings {
        eprintln!("{} {}", yellow("⚠"), warning);
    }
    if let Some(ref report) = summary.conversion {
        print_stage("Conversion", report);
    }
    if let Some(ref report) = summary.extraction {
        let title = match summary.mode {
            ExtractionMode::Llm => "Extraction",
            ExtractionMode::Template => "Templates",
        };
        print_stage(title, report);
    }
    let mark = if summary.failed_count() == 0 {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!("{}  done in {}ms", mark, summary.total_duration_ms);
}

fn print_stage(title: &str, report: &StageReport) {
    if report.total() == 0 {
        return;
    }
    eprintln!(
        "{}  {} processed, {} skipped, {} failed",
        bold(title),
        report.processed_count(),
        report.skipped_count(),
        report.failed_count()
    );
    for o in report.processed() {
        let target = o
            .artifact()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!("  {} {}  {}", green("✓"), o.key, dim(&target));
    }
    for o in report.skipped() {
        eprintln!("  {} {}", yellow("–"), o.key);
    }
    for o in report.failed() {
        let reason = o.error().map(|e| e.to_string()).unwrap_or_default();
        eprintln!("  {} {}  {}", red("✗"), o.key, red(&short(&reason)));
    }
}
