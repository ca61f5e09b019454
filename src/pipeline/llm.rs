//! Language-model interaction: send one prompt, get one answer.
//!
//! The extraction stage only depends on [`LanguageModel`]. The production
//! implementation, [`ProviderModel`], resolves a provider through
//! `edgequake_llm::ProviderFactory` (a local Ollama runtime by default) and
//! sends the prompt as a single user message.
//!
//! There is no retry and no timeout: one request per Document, and a failed
//! request is terminal for that Document.

use crate::config::RunConfig;
use crate::error::LlmError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Boxed future returned by [`LanguageModel::generate`].
pub type GenerateFuture<'a> = BoxFuture<'a, Result<String, LlmError>>;

/// Capability: answer `prompt` with `model`.
pub trait LanguageModel: Send + Sync {
    /// Returns the model's text, or why there is none.
    ///
    /// Implementations must map a whitespace-only answer to
    /// [`LlmError::EmptyResponse`].
    fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> GenerateFuture<'a>;
}

/// [`LanguageModel`] backed by an edgequake-llm provider.
pub struct ProviderModel {
    provider_name: String,
    options: CompletionOptions,
}

impl ProviderModel {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Provider, temperature and token limit taken from the run config.
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            provider_name: config.provider_name.clone(),
            options: build_options(config),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn provider(&self, model: &str) -> Result<Arc<dyn LLMProvider>, LlmError> {
        ProviderFactory::create_llm_provider(&self.provider_name, model).map_err(|e| {
            LlmError::Unavailable {
                model: model.to_string(),
                detail: format!("provider '{}' not configured: {}", self.provider_name, e),
            }
        })
    }
}

impl LanguageModel for ProviderModel {
    fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            let provider = self.provider(model)?;
            let messages = vec![ChatMessage::user(prompt)];
            let start = Instant::now();

            let response = provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| LlmError::Unavailable {
                    model: model.to_string(),
                    detail: with_hint(&self.provider_name, model, e.to_string()),
                })?;

            debug!(
                "{}: {} input tokens, {} output tokens, {:?}",
                model,
                response.prompt_tokens,
                response.completion_tokens,
                start.elapsed()
            );

            non_empty(model, response.content)
        })
    }
}

/// Reject whitespace-only answers.
pub fn non_empty(model: &str, content: String) -> Result<String, LlmError> {
    if content.trim().is_empty() {
        Err(LlmError::EmptyResponse {
            model: model.to_string(),
        })
    } else {
        Ok(content)
    }
}

fn with_hint(provider_name: &str, model: &str, detail: String) -> String {
    if provider_name.eq_ignore_ascii_case("ollama") {
        format!("{detail} (is Ollama running? pull the model with: ollama pull {model})")
    } else {
        detail
    }
}

/// Build `CompletionOptions` from the run config.
fn build_options(config: &RunConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
