//! Configuration types for a reference-extraction run.
//!
//! A run is controlled by exactly one [`RunConfig`], built once via its
//! [`RunConfigBuilder`] and passed by reference to every stage. The record is
//! never mutated after `build()`, so every Document in a run sees the same
//! query, model and directories.

use crate::document::DocumentKey;
use crate::error::RefExtractError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "ministral-3";

/// Provider used when none is given: a local Ollama runtime.
pub const DEFAULT_PROVIDER: &str = "ollama";

/// The user's query plus the model that should answer it.
///
/// Shared read-only by every Document processed in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Free-text instruction, passed to the model verbatim.
    pub query: String,
    /// Model identifier understood by the selected provider.
    pub model: String,
}

/// What the extraction stage produces for each staged text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionMode {
    /// Ask the language model and save its answer under the output directory.
    #[default]
    Llm,
    /// Skip the model and write a fill-in scaffold under the templates directory.
    Template,
}

/// The four directories a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// PDFs to convert. Never written to.
    pub input_dir: PathBuf,
    /// One `<base>.txt` per converted PDF.
    pub staging_dir: PathBuf,
    /// One `<base>_template.py` per Document in template mode.
    pub templates_dir: PathBuf,
    /// One `<base>_references.txt` per Document in LLM mode.
    pub output_dir: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("inputs"),
            staging_dir: PathBuf::from("tmp/txts"),
            templates_dir: PathBuf::from("tmp/extraction_templates"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl Workspace {
    /// The default layout re-rooted under `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let d = Self::default();
        Self {
            input_dir: root.join(d.input_dir),
            staging_dir: root.join(d.staging_dir),
            templates_dir: root.join(d.templates_dir),
            output_dir: root.join(d.output_dir),
        }
    }

    pub fn staged_path(&self, key: &DocumentKey) -> PathBuf {
        self.staging_dir.join(key.staged_file_name())
    }

    pub fn references_path(&self, key: &DocumentKey) -> PathBuf {
        self.output_dir.join(key.references_file_name())
    }

    pub fn template_path(&self, key: &DocumentKey) -> PathBuf {
        self.templates_dir.join(key.template_file_name())
    }

    /// The directories wiped by the clear step.
    pub fn clearable_dirs(&self) -> [&Path; 2] {
        [&self.staging_dir, &self.templates_dir]
    }
}

/// Configuration for one run.
///
/// Built via [`RunConfig::builder()`]; there is no `Default` because a run
/// without a query is meaningless.
///
/// # Example
/// ```rust
/// use edgequake_refextract::{ExtractionMode, RunConfig};
///
/// let config = RunConfig::builder()
///     .query("Extract the references cited in the Related Work section")
///     .model("llama3.2")
///     .extract(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.mode, ExtractionMode::Template);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub request: ExtractionRequest,

    /// edgequake-llm provider name ("ollama", "anthropic", "openai", ...).
    pub provider_name: String,

    /// Convert PDFs before extracting. When false, existing staged text is used.
    pub convert: bool,

    pub mode: ExtractionMode,

    /// Empty the staging and templates directories before converting.
    pub clear: bool,

    pub workspace: Workspace,

    /// Replaces the built-in extraction instruction when set.
    pub instructions: Option<String>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Reference lists must be copied, not paraphrased, so the default stays
    /// close to zero.
    pub temperature: f32,

    /// Maximum tokens the model may generate per Document. Default: 8192.
    pub max_tokens: usize,
}

impl RunConfig {
    /// Create a new builder with every field at its default.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            query: None,
            config: RunConfig {
                request: ExtractionRequest {
                    query: String::new(),
                    model: DEFAULT_MODEL.to_string(),
                },
                provider_name: DEFAULT_PROVIDER.to_string(),
                convert: true,
                mode: ExtractionMode::Llm,
                clear: true,
                workspace: Workspace::default(),
                instructions: None,
                temperature: 0.1,
                max_tokens: 8192,
            },
        }
    }

    /// True when the extraction stage calls the language model.
    pub fn extract(&self) -> bool {
        self.mode == ExtractionMode::Llm
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    query: Option<String>,
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// An empty string keeps the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.config.request.model = model;
        }
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn convert(mut self, v: bool) -> Self {
        self.config.convert = v;
        self
    }

    /// `true` selects [`ExtractionMode::Llm`], `false` [`ExtractionMode::Template`].
    pub fn extract(mut self, v: bool) -> Self {
        self.config.mode = if v {
            ExtractionMode::Llm
        } else {
            ExtractionMode::Template
        };
        self
    }

    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn clear(mut self, v: bool) -> Self {
        self.config.clear = v;
        self
    }

    pub fn workspace(mut self, workspace: Workspace) -> Self {
        self.config.workspace = workspace;
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace.input_dir = dir.into();
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace.staging_dir = dir.into();
        self
    }

    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace.templates_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace.output_dir = dir.into();
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, RefExtractError> {
        let mut config = self.config;

        let query = self.query.unwrap_or_default();
        if query.trim().is_empty() {
            return Err(RefExtractError::MissingQuery);
        }
        config.request.query = query;

        if config.provider_name.trim().is_empty() {
            return Err(RefExtractError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if config.max_tokens == 0 {
            return Err(RefExtractError::InvalidConfig(
                "max tokens must be ≥ 1".into(),
            ));
        }

        let ws = &config.workspace;
        for (name, cleared) in [
            ("staging", &ws.staging_dir),
            ("templates", &ws.templates_dir),
        ] {
            for (other, kept) in [("input", &ws.input_dir), ("output", &ws.output_dir)] {
                if contains_dir(cleared, kept) {
                    return Err(RefExtractError::InvalidConfig(format!(
                        "{name} directory '{}' is cleared before each run and must not \
                         be or contain the {other} directory '{}'",
                        cleared.display(),
                        kept.display()
                    )));
                }
            }
        }

        Ok(config)
    }
}

/// True when `inner` is `outer` or lies somewhere below it.
fn contains_dir(outer: &Path, inner: &Path) -> bool {
    resolve(inner).starts_with(resolve(outer))
}

/// Absolute, `.`/`..`-free form of `path`, with the deepest existing
/// ancestor canonicalised so symlinked prefixes compare equal.
fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }
    lexical
}
