//! Building blocks shared by the convert and extract stages.
//!
//! ## Data Flow
//!
//! ```text
//! inputs/*.pdf ──▶ input ──▶ text ──▶ store ──▶ tmp/txts/<base>.txt
//!
//! tmp/txts/<base>.txt ──┬─▶ llm ──────▶ store ──▶ outputs/<base>_references.txt
//!                       └─▶ template ─▶ store ──▶ tmp/extraction_templates/<base>_template.py
//! ```
//!
//! 1. [`input`]    : list PDFs and staged files; check PDF magic bytes
//! 2. [`text`]     : PDF → ordered page texts ([`text::TextExtractor`])
//! 3. [`llm`]      : prompt → answer ([`llm::LanguageModel`]); the only
//!    stage with network I/O
//! 4. [`template`] : staged text → standalone fill-in script
//! 5. [`store`]    : atomic artifact writes and directory clearing
//!
//! [`mock`] holds scripted stand-ins for the two external collaborators.

pub mod input;
pub mod llm;
pub mod mock;
pub mod store;
pub mod template;
pub mod text;
