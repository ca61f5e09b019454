//! Orchestrator scenarios over a temporary workspace.
//!
//! pdfium and the model runtime are replaced by the scripted collaborators in
//! `pipeline::mock`, so these run anywhere:
//!   cargo test --test pipeline

use edgequake_refextract::pipeline::mock::{MockAnswer, MockExtractor, MockModel};
use edgequake_refextract::{
    run, DocumentError, DocumentKey, ExtractionMode, LlmError, NoopProgress, PipelineProgress,
    RefExtractError, RunConfig, RunSummary, Stage, StagedText, Workspace,
};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const QUERY: &str = "Extract the references cited in the Introduction";

fn workspace_with_pdfs(names: &[&str]) -> (TempDir, Workspace) {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::rooted_at(tmp.path());
    std::fs::create_dir_all(&ws.input_dir).unwrap();
    for name in names {
        std::fs::write(ws.input_dir.join(name), b"%PDF-1.7\n%stub\n").unwrap();
    }
    (tmp, ws)
}

fn config(ws: &Workspace) -> RunConfig {
    RunConfig::builder()
        .query(QUERY)
        .model("ministral-3")
        .workspace(ws.clone())
        .build()
        .unwrap()
}

fn three_page_paper() -> MockExtractor {
    MockExtractor::new().with_pages(
        "paper.pdf",
        vec![
            "Introduction\nLarge models [1] and retrieval [2, 3].",
            "Method\nWe follow [3].",
            "References\n[1] A. One. 2020.\n[2] B. Two. 2021.\n[3] C. Three. 2022.",
        ],
    )
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

async fn run_with(config: &RunConfig, ex: &MockExtractor, model: &MockModel) -> RunSummary {
    run(config, Some(ex), model, &NoopProgress).await.unwrap()
}

// ── Full workflow ────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_flags_convert_then_ask_the_model() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    let cfg = config(&ws);
    let model = MockModel::answering("[1] A. One. 2020.\n[2] B. Two. 2021.");

    let summary = run_with(&cfg, &three_page_paper(), &model).await;

    // staged text: three marked page sections
    let staged = std::fs::read_to_string(ws.staging_dir.join("paper.txt")).unwrap();
    assert_eq!(staged.matches("--- page ").count(), 3);
    let parsed = StagedText::parse(DocumentKey::new("paper"), &staged);
    assert_eq!(parsed.page_count(), 3);

    // answer saved verbatim
    let answer = std::fs::read_to_string(ws.output_dir.join("paper_references.txt")).unwrap();
    assert_eq!(answer, "[1] A. One. 2020.\n[2] B. Two. 2021.");

    // the prompt carried the query and every page
    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ministral-3");
    assert!(calls[0].1.contains(QUERY));
    for marker in ["--- page 1 ---", "--- page 2 ---", "--- page 3 ---"] {
        assert!(calls[0].1.contains(marker), "prompt misses {marker}");
    }

    assert_eq!(summary.mode, ExtractionMode::Llm);
    assert_eq!(summary.failed_count(), 0);
    assert!(files_in(&ws.templates_dir).is_empty());
}

#[tokio::test]
async fn no_extract_writes_templates_and_leaves_outputs_alone() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    let cfg = RunConfig::builder()
        .query(QUERY)
        .extract(false)
        .workspace(ws.clone())
        .build()
        .unwrap();
    let model = MockModel::answering("unused");

    let summary = run_with(&cfg, &three_page_paper(), &model).await;

    assert_eq!(files_in(&ws.templates_dir), vec!["paper_template.py"]);
    assert!(files_in(&ws.output_dir).is_empty());
    assert_eq!(model.call_count(), 0);

    let script = std::fs::read_to_string(ws.templates_dir.join("paper_template.py")).unwrap();
    assert!(script.contains("PAPER_TEXT = "));
    assert!(script.contains("Large models [1] and retrieval [2, 3]."));
    assert_eq!(summary.mode, ExtractionMode::Template);
}

#[tokio::test]
async fn several_papers_are_processed_in_name_order() {
    let (_tmp, ws) = workspace_with_pdfs(&["b.pdf", "a.pdf", "c.PDF", "notes.txt"]);
    let ex = MockExtractor::new()
        .with_pages("a.pdf", vec!["A"])
        .with_pages("b.pdf", vec!["B"])
        .with_pages("c.PDF", vec!["C"]);
    let model = MockModel::answering("[1] X.");

    let summary = run_with(&config(&ws), &ex, &model).await;

    let keys: Vec<_> = summary
        .conversion
        .as_ref()
        .unwrap()
        .outcomes
        .iter()
        .map(|o| o.key.to_string())
        .collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(
        files_in(&ws.output_dir),
        vec!["a_references.txt", "b_references.txt", "c_references.txt"]
    );
}

// ── Empty input ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_input_dir_warns_and_writes_nothing() {
    let (_tmp, ws) = workspace_with_pdfs(&[]);
    let model = MockModel::answering("x");

    let summary = run_with(&config(&ws), &MockExtractor::new(), &model).await;

    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("No PDF files found"));
    assert!(summary.extraction.is_none());
    assert!(files_in(&ws.staging_dir).is_empty());
    assert!(files_in(&ws.output_dir).is_empty());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn missing_input_dir_behaves_like_empty() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::rooted_at(tmp.path());
    let summary = run_with(&config(&ws), &MockExtractor::new(), &MockModel::answering("x")).await;
    assert_eq!(summary.warnings.len(), 1);
    assert!(!ws.input_dir.exists());
}

#[tokio::test]
async fn no_convert_without_staged_text_is_fatal() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    let cfg = RunConfig::builder()
        .query(QUERY)
        .convert(false)
        .clear(false)
        .workspace(ws.clone())
        .build()
        .unwrap();

    let err = run(&cfg, None, &MockModel::answering("x"), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, RefExtractError::NoStagedText { .. }));
    assert!(files_in(&ws.output_dir).is_empty());
}

#[test]
fn missing_query_is_fatal() {
    let err = RunConfig::builder().query("   ").build().unwrap_err();
    assert!(matches!(err, RefExtractError::MissingQuery));
}

// ── Per-file failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn model_failure_is_recorded_and_writes_no_file() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    let model = MockModel::unavailable("model 'ministral-3' not found");

    let summary = run_with(&config(&ws), &three_page_paper(), &model).await;

    let extraction = summary.extraction.as_ref().unwrap();
    assert_eq!(extraction.failed_count(), 1);
    assert!(matches!(
        extraction.outcomes[0].error(),
        Some(DocumentError::Model(LlmError::Unavailable { .. }))
    ));
    assert!(files_in(&ws.output_dir).is_empty());
    // staged text survives for a later --no-convert run
    assert_eq!(files_in(&ws.staging_dir), vec!["paper.txt"]);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_others() {
    let (_tmp, ws) = workspace_with_pdfs(&["a.pdf", "b.pdf", "c.pdf"]);
    let ex = MockExtractor::new()
        .with_pages("a.pdf", vec!["A"])
        .with_error("b.pdf", DocumentError::Encrypted)
        .with_pages("c.pdf", vec!["C"]);
    let model = MockModel::with_sequence(vec![
        MockAnswer::Text("[1] A.".into()),
        MockAnswer::Text("".into()),
    ]);

    let summary = run_with(&config(&ws), &ex, &model).await;

    assert_eq!(summary.conversion.as_ref().unwrap().failed_count(), 1);
    let extraction = summary.extraction.as_ref().unwrap();
    assert_eq!(extraction.total(), 2);
    assert_eq!(extraction.processed_count(), 1);
    assert!(matches!(
        extraction.outcomes[1].error(),
        Some(DocumentError::Model(LlmError::EmptyResponse { .. }))
    ));
    assert_eq!(files_in(&ws.output_dir), vec!["a_references.txt"]);
    assert_eq!(summary.failed_count(), 2);
}

// ── Clear step ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_leaves_only_this_runs_artifacts() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    std::fs::create_dir_all(&ws.staging_dir).unwrap();
    std::fs::create_dir_all(&ws.templates_dir).unwrap();
    std::fs::create_dir_all(&ws.output_dir).unwrap();
    std::fs::write(ws.staging_dir.join("old.txt"), "--- page 1 ---\nold\n").unwrap();
    std::fs::write(ws.templates_dir.join("old_template.py"), "# old").unwrap();
    std::fs::write(ws.output_dir.join("old_references.txt"), "kept").unwrap();

    let summary = run_with(&config(&ws), &three_page_paper(), &MockModel::answering("[1] A.")).await;

    assert_eq!(summary.cleared, 2);
    assert_eq!(files_in(&ws.staging_dir), vec!["paper.txt"]);
    assert!(files_in(&ws.templates_dir).is_empty());
    // outputs are never cleared
    assert_eq!(
        files_in(&ws.output_dir),
        vec!["old_references.txt", "paper_references.txt"]
    );
    assert!(ws.input_dir.join("paper.pdf").exists());
}

#[tokio::test]
async fn no_clear_preserves_existing_staged_text() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    std::fs::create_dir_all(&ws.staging_dir).unwrap();
    std::fs::write(ws.staging_dir.join("earlier.txt"), "--- page 1 ---\nearlier\n").unwrap();

    let cfg = RunConfig::builder()
        .query(QUERY)
        .clear(false)
        .workspace(ws.clone())
        .build()
        .unwrap();
    let model = MockModel::answering("[1] A.");
    let summary = run_with(&cfg, &three_page_paper(), &model).await;

    assert_eq!(summary.cleared, 0);
    assert_eq!(
        std::fs::read_to_string(ws.staging_dir.join("earlier.txt")).unwrap(),
        "--- page 1 ---\nearlier\n"
    );
    // both the old and the new staged text are extracted
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn no_convert_reuses_staged_text() {
    let tmp = TempDir::new().unwrap();
    let ws = Workspace::rooted_at(tmp.path());
    std::fs::create_dir_all(&ws.staging_dir).unwrap();
    std::fs::write(
        ws.staging_dir.join("kept.txt"),
        "--- page 1 ---\nIntroduction [4]\n\n--- page 2 ---\n[4] D. Four.\n",
    )
    .unwrap();

    let cfg = RunConfig::builder()
        .query(QUERY)
        .convert(false)
        .clear(false)
        .workspace(ws.clone())
        .build()
        .unwrap();
    let model = MockModel::answering("[4] D. Four.");
    let summary = run(&cfg, None, &model, &NoopProgress).await.unwrap();

    assert!(summary.conversion.is_none());
    assert_eq!(files_in(&ws.output_dir), vec!["kept_references.txt"]);
    assert!(model.calls()[0].1.contains("Introduction [4]"));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl PipelineProgress for Recorder {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        self.events.lock().unwrap().push(format!("start {stage} {total}"));
    }
    fn on_document_complete(
        &self,
        stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        _artifact: &Path,
    ) {
        self.events
            .lock()
            .unwrap()
            .push(format!("ok {stage} {key} {index}/{total}"));
    }
    fn on_document_error(
        &self,
        stage: Stage,
        key: &DocumentKey,
        index: usize,
        total: usize,
        _error: &str,
    ) {
        self.events
            .lock()
            .unwrap()
            .push(format!("err {stage} {key} {index}/{total}"));
    }
    fn on_stage_complete(&self, stage: Stage, total: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {stage} {success_count}/{total}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_stages() {
    let (_tmp, ws) = workspace_with_pdfs(&["a.pdf", "b.pdf"]);
    let ex = MockExtractor::new()
        .with_pages("a.pdf", vec!["A"])
        .with_error("b.pdf", DocumentError::Encrypted);
    let recorder = Recorder::default();

    run(&config(&ws), Some(&ex), &MockModel::answering("[1] A."), &recorder)
        .await
        .unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start convert 2",
            "ok convert a 1/2",
            "err convert b 2/2",
            "done convert 1/2",
            "start extract 1",
            "ok extract a 1/1",
            "done extract 1/1",
        ]
    );
}

#[tokio::test]
async fn summary_serialises_to_json() {
    let (_tmp, ws) = workspace_with_pdfs(&["paper.pdf"]);
    let summary = run_with(&config(&ws), &three_page_paper(), &MockModel::answering("[1] A.")).await;

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["mode"], "Llm");
    assert_eq!(json["extraction"]["outcomes"][0]["status"], "processed");
    assert_eq!(json["extraction"]["outcomes"][0]["key"], "paper");
}
