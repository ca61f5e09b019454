//! Documents, their join key, and the staged-text file format.
//!
//! Every artifact of a PDF is named after its [`DocumentKey`]: the key is
//! derived once from the PDF (or staged) file name and threaded unchanged
//! through staging and extraction, so `paper.pdf` always yields
//! `paper.txt`, `paper_references.txt` and `paper_template.py`.
//!
//! ## Staged text format
//!
//! ```text
//! --- page 1 ---
//! Abstract. We study ...
//!
//! --- page 2 ---
//! 1 Introduction ...
//! ```
//!
//! Each page section opens with its own marker line, even when the page has
//! no text, so the marker count always equals the PDF page count. A page
//! line that looks like a marker (a table of contents, say) is written with
//! one extra leading backslash and restored on parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Base name shared by all artifacts of one Document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Key of a file: its name without the final extension.
    ///
    /// `None` for paths without a usable UTF-8 file stem.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() {
            None
        } else {
            Some(Self(stem.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn staged_file_name(&self) -> String {
        format!("{}.txt", self.0)
    }

    pub fn references_file_name(&self) -> String {
        format!("{}_references.txt", self.0)
    }

    pub fn template_file_name(&self) -> String {
        format!("{}_template.py", self.0)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One input PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub key: DocumentKey,
    pub path: PathBuf,
}

/// A text file already present in the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub key: DocumentKey,
    pub path: PathBuf,
}

/// The extracted text of one Document, one entry per page in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedText {
    pub key: DocumentKey,
    pub pages: Vec<String>,
}

static RE_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^--- page (\d+) ---$").unwrap());

/// A page line shaped like a marker, possibly already escaped.
static RE_MARKER_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\\*--- page \d+ ---)$").unwrap());

/// An escaped marker-shaped line.
static RE_ESCAPED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\\(\\*--- page \d+ ---)$").unwrap());

/// The marker line opening page `page_num` (1-indexed).
pub fn page_marker(page_num: usize) -> String {
    format!("--- page {page_num} ---")
}

impl StagedText {
    pub fn new(key: DocumentKey, pages: Vec<String>) -> Self {
        Self { key, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// True when no page carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }

    /// Render the staged file body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&page_marker(i + 1));
            out.push('\n');
            let body = page.trim_end();
            if !body.is_empty() {
                out.push_str(&RE_MARKER_LIKE.replace_all(body, r"\${1}"));
                out.push('\n');
            }
        }
        out
    }

    /// Recover pages from a staged file body.
    ///
    /// Text before the first marker (or a body with no marker at all) is
    /// kept as a single leading page so hand-edited files are not lost.
    pub fn parse(key: DocumentKey, body: &str) -> Self {
        let markers: Vec<(usize, usize)> = RE_PAGE_MARKER
            .find_iter(body)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut pages = Vec::with_capacity(markers.len().max(1));

        let head_end = markers.first().map(|m| m.0).unwrap_or(body.len());
        let head = body[..head_end].trim();
        if !head.is_empty() {
            pages.push(RE_ESCAPED_MARKER.replace_all(head, "${1}").into_owned());
        }

        for (i, &(_, end)) in markers.iter().enumerate() {
            let next = markers.get(i + 1).map(|m| m.0).unwrap_or(body.len());
            let text = body[end..next].trim_start_matches('\n').trim_end();
            pages.push(RE_ESCAPED_MARKER.replace_all(text, "${1}").into_owned());
        }

        Self { key, pages }
    }
}
