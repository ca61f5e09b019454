//! Input discovery: list the PDFs and staged text files a stage works on.
//!
//! Listing is non-recursive and sorted by file name so runs are
//! reproducible. A missing directory lists as empty; it is never created
//! here because the input directory is read-only to this tool.

use crate::document::{Document, DocumentKey, StagedFile};
use crate::error::{DocumentError, RefExtractError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// PDFs directly inside `dir`, sorted by file name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<Document>, RefExtractError> {
    Ok(list_with_extension(dir, "pdf")?
        .into_iter()
        .filter_map(|path| match DocumentKey::from_path(&path) {
            Some(key) => Some(Document { key, path }),
            None => {
                warn!("Ignoring PDF with unusable name: {}", path.display());
                None
            }
        })
        .collect())
}

/// Staged `.txt` files directly inside `dir`, sorted by file name.
pub fn discover_staged(dir: &Path) -> Result<Vec<StagedFile>, RefExtractError> {
    Ok(list_with_extension(dir, "txt")?
        .into_iter()
        .filter_map(|path| DocumentKey::from_path(&path).map(|key| StagedFile { key, path }))
        .collect())
}

fn list_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, RefExtractError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Directory {} does not exist; nothing to list", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(RefExtractError::DirectoryRead {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RefExtractError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Verify that `path` is readable and starts with the `%PDF` magic bytes.
///
/// Runs before any extractor touches the file so callers get a meaningful
/// per-file error rather than a parser crash.
pub fn check_pdf_header(path: &Path) -> Result<(), DocumentError> {
    let mut f = std::fs::File::open(path).map_err(|e| DocumentError::Unreadable {
        detail: e.to_string(),
    })?;

    let mut magic = [0u8; 4];
    let mut read = 0;
    while read < magic.len() {
        match f.read(&mut magic[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) => {
                return Err(DocumentError::Unreadable {
                    detail: e.to_string(),
                })
            }
        }
    }

    if &magic[..read] != b"%PDF" {
        return Err(DocumentError::NotAPdf {
            magic: magic[..read].to_vec(),
        });
    }
    Ok(())
}
