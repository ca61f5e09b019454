//! Scripted collaborators for tests.
//!
//! [`MockExtractor`] stands in for pdfium and [`MockModel`] for the language
//! model runtime, so every stage can run without native libraries or a
//! network.

use super::llm::{non_empty, GenerateFuture, LanguageModel};
use super::text::TextExtractor;
use crate::error::{DocumentError, LlmError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A [`TextExtractor`] answering from a table keyed by file name.
///
/// Unknown files fail with [`DocumentError::Corrupt`].
#[derive(Default)]
pub struct MockExtractor {
    pages: HashMap<String, Result<Vec<String>, DocumentError>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `file_name` extracts to `pages`.
    pub fn with_pages<S: Into<String>>(mut self, file_name: &str, pages: Vec<S>) -> Self {
        self.pages.insert(
            file_name.to_string(),
            Ok(pages.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// `file_name` fails with `error`.
    pub fn with_error(mut self, file_name: &str, error: DocumentError) -> Self {
        self.pages.insert(file_name.to_string(), Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for MockExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.pages.get(name) {
            Some(result) => result.clone(),
            None => Err(DocumentError::Corrupt {
                detail: format!("no scripted pages for '{name}'"),
            }),
        }
    }
}

/// A configurable mock response for [`MockModel`].
#[derive(Clone, Debug)]
pub enum MockAnswer {
    /// Answer with this text (whitespace-only text becomes `EmptyResponse`).
    Text(String),
    /// Fail as if the model were not installed.
    Unavailable(String),
}

/// A [`LanguageModel`] replaying scripted answers.
///
/// Answers are consumed in order; the last one repeats once the script is
/// exhausted. Every prompt is recorded for inspection.
pub struct MockModel {
    /// Reversed so `pop()` yields the next answer.
    script: Mutex<Vec<MockAnswer>>,
    fallback: MockAnswer,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockModel {
    /// Always answer `text`.
    pub fn answering(text: impl Into<String>) -> Self {
        Self::with_sequence(vec![MockAnswer::Text(text.into())])
    }

    /// Always fail with `LlmError::Unavailable`.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::with_sequence(vec![MockAnswer::Unavailable(detail.into())])
    }

    /// Answer in order, repeating the last answer.
    ///
    /// # Panics
    /// If `answers` is empty.
    pub fn with_sequence(mut answers: Vec<MockAnswer>) -> Self {
        assert!(!answers.is_empty(), "sequence must have at least one answer");
        let fallback = answers[answers.len() - 1].clone();
        answers.reverse();
        Self {
            script: Mutex::new(answers),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// `(model, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_answer(&self) -> MockAnswer {
        match self.script.lock() {
            Ok(mut script) => script.pop().unwrap_or_else(|| self.fallback.clone()),
            Err(_) => self.fallback.clone(),
        }
    }
}

impl LanguageModel for MockModel {
    fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> GenerateFuture<'a> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((model.to_string(), prompt.to_string()));
        }
        let answer = self.next_answer();

        Box::pin(async move {
            match answer {
                MockAnswer::Text(text) => non_empty(model, text),
                MockAnswer::Unavailable(detail) => Err(LlmError::Unavailable {
                    model: model.to_string(),
                    detail,
                }),
            }
        })
    }
}
