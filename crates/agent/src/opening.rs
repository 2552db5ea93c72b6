//! Opening-turn construction — a packed workspace as the first turn.
//!
//! The same pipeline the scan tool runs mid-conversation, used up front:
//! the caller's request plus the formatted workspace context become the
//! opening user turn of a fresh transcript.

use std::path::Path;

use atelier_context::{allocate, format_selection, scan_directory, AllocationPolicy, ScanOptions};
use atelier_core::error::ScanError;
use atelier_core::turn::Turn;

/// Scan `root`, pack it into the ceiling, and wrap it with the user's
/// request as an opening turn.
pub fn workspace_opening(
    root: &Path,
    request_text: &str,
    options: &ScanOptions,
    policy: &AllocationPolicy,
) -> Result<Turn, ScanError> {
    let files = scan_directory(root, options)?;
    let selection = allocate(files, policy);
    let document = format_selection(&selection);
    Ok(Turn::user(format!("{request_text}\n\n{document}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn opening_turn_contains_request_and_context() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{ \"name\": \"acme\" }").unwrap();

        let turn = workspace_opening(
            tmp.path(),
            "Summarize this project",
            &ScanOptions::default(),
            &AllocationPolicy::default(),
        )
        .unwrap();

        let text = turn.text().unwrap();
        assert!(text.starts_with("Summarize this project"));
        assert!(text.contains("===== FILE: package.json ====="));
    }

    #[test]
    fn bad_root_propagates_scan_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir.txt");
        fs::write(&file, "x").unwrap();

        let err = workspace_opening(
            &file,
            "hi",
            &ScanOptions::default(),
            &AllocationPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::RootNotADirectory(_)));
    }
}
