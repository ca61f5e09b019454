//! Artifact persistence: atomic writes and directory clearing.

use crate::error::{DocumentError, RefExtractError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: &Path) -> Result<(), RefExtractError> {
    std::fs::create_dir_all(dir).map_err(|source| RefExtractError::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, replacing any existing file.
///
/// Atomic write: temp file in the same directory, then rename, so a failed
/// write never leaves a partial artifact behind.
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), DocumentError> {
    let fail = |e: std::io::Error| DocumentError::WriteArtifact {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(contents.as_bytes()).map_err(fail)?;
    tmp.flush().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Remove everything inside `dir`, keeping `dir` itself.
///
/// Idempotent: a missing or empty directory is a no-op. Returns the number
/// of entries removed.
pub fn clear_dir(dir: &Path) -> Result<usize, RefExtractError> {
    let fail = |source: std::io::Error| RefExtractError::DirectoryClear {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(fail(e)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(fail)?.path();
        if path.is_dir() && !path.is_symlink() {
            std::fs::remove_dir_all(&path).map_err(fail)?;
        } else {
            std::fs::remove_file(&path).map_err(fail)?;
        }
        debug!("Removed {}", path.display());
        removed += 1;
    }
    Ok(removed)
}
