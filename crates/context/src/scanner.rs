//! Bounded directory scanning.
//!
//! The walk is an explicit pending-queue traversal with a returned
//! accumulator — no recursion, no shared mutable state. Denylisted
//! directories are pruned before descent, so a `node_modules` holding
//! ten thousand files costs one name comparison. The scan is
//! self-bounding: a visited-file ceiling and a per-file byte ceiling
//! keep worst-case walks finite without an external timeout.
//!
//! Unreadable entries are skipped silently (best-effort); only a
//! non-directory root is an error.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use atelier_core::error::ScanError;

use crate::classify::{classify, is_excluded_dir, PriorityTier};
use crate::token::estimate_tokens;

/// A file read during a scan. Paths are relative to the scan root and
/// forward-slash normalized.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    pub estimated_tokens: usize,
}

/// Scan bounds. Defaults mirror the product's configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Stop scanning entirely after this many files have been visited.
    pub max_files: usize,
    /// Skip files larger than this many bytes.
    pub max_file_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_files: 2000,
            max_file_bytes: 262_144,
        }
    }
}

/// Walk `root` and return the readable, non-excluded text files.
///
/// Directory entries are processed in sorted order so the result is
/// deterministic for a given tree. Excluded files are never opened;
/// binary files (NUL byte in content) are dropped without a text decode
/// attempt.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<Vec<FileRecord>, ScanError> {
    let meta = std::fs::metadata(root).map_err(|e| ScanError::RootUnreadable {
        path: root.display().to_string(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(ScanError::RootNotADirectory(root.display().to_string()));
    }

    let mut files = Vec::new();
    let mut pending: VecDeque<PathBuf> = VecDeque::from([root.to_path_buf()]);
    let mut visited = 0usize;

    'walk: while let Some(dir) = pending.pop_front() {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        entries.sort();

        for entry in entries {
            let file_type = match entry.symlink_metadata() {
                Ok(m) => m.file_type(),
                Err(_) => continue,
            };
            // Symlinks are neither descended nor read; a link back into
            // the tree would defeat the file-count bound.
            if file_type.is_symlink() {
                continue;
            }

            if file_type.is_dir() {
                let name = entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                if is_excluded_dir(name) {
                    debug!(dir = %entry.display(), "Pruned denylisted directory");
                    continue;
                }
                pending.push_back(entry);
                continue;
            }

            visited += 1;
            if visited > options.max_files {
                warn!(
                    max_files = options.max_files,
                    "Scan file ceiling reached, stopping"
                );
                break 'walk;
            }

            if let Some(record) = read_record(root, &entry, options) {
                files.push(record);
            }
        }
    }

    debug!(
        root = %root.display(),
        visited,
        read = files.len(),
        "Scan complete"
    );
    Ok(files)
}

/// Read one file into a record, or `None` if any bound or check rules
/// it out.
fn read_record(root: &Path, path: &Path, options: &ScanOptions) -> Option<FileRecord> {
    let relative = relative_path(root, path)?;

    // Classification is on the path alone, so excluded files are ruled
    // out before any read.
    if classify(&relative) == PriorityTier::Excluded {
        return None;
    }

    let meta = path.metadata().ok()?;
    if meta.len() > options.max_file_bytes {
        debug!(file = %relative, bytes = meta.len(), "Skipping oversized file");
        return None;
    }

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            debug!(file = %relative, error = %e, "Skipping unreadable file");
            return None;
        }
    };
    if bytes.contains(&0) {
        debug!(file = %relative, "Skipping binary file");
        return None;
    }

    let content = String::from_utf8_lossy(&bytes).into_owned();
    let estimated_tokens = estimate_tokens(&content);
    Some(FileRecord {
        path: relative,
        content,
        estimated_tokens,
    })
}

/// Root-relative path with forward slashes on every platform.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(component.as_os_str().to_str()?);
    }
    Some(out)
}
