//! Scan-workspace tool — directory tree in, bounded context text out.
//!
//! Runs the full packing pipeline: bounded scan → classify → allocate →
//! format. The walk is blocking filesystem I/O and self-bounding via its
//! file-count and byte-size ceilings, so it runs on the blocking pool
//! rather than under an external timeout. A non-directory root is a
//! failure for this call only, reported as result text.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use atelier_context::{allocate, format_selection, scan_directory, AllocationPolicy, ScanOptions};
use atelier_core::error::ToolError;
use atelier_core::event::{DomainEvent, EventBus};
use atelier_core::tool::{Tool, ToolResult};

use crate::decode_args;

#[derive(Debug, Deserialize)]
struct ScanWorkspaceArgs {
    path: String,
}

pub struct ScanWorkspaceTool {
    scan_options: ScanOptions,
    allocation: AllocationPolicy,
    event_bus: Arc<EventBus>,
}

impl ScanWorkspaceTool {
    pub fn new(
        scan_options: ScanOptions,
        allocation: AllocationPolicy,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            scan_options,
            allocation,
            event_bus,
        }
    }
}

#[async_trait]
impl Tool for ScanWorkspaceTool {
    fn name(&self) -> &str {
        "scan_workspace"
    }

    fn description(&self) -> &str {
        "Scan a local directory and return its contents packed into a \
         bounded text context: manifests first, then schemas and routes, \
         then source files, with oversized files truncated or path-listed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute path of the directory to scan"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ScanWorkspaceArgs = decode_args(self.name(), arguments)?;

        let root = PathBuf::from(&args.path);
        let options = self.scan_options.clone();
        let scanned = tokio::task::spawn_blocking(move || scan_directory(&root, &options))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("scan task failed: {e}"),
            })?;

        let files = match scanned {
            Ok(files) => files,
            Err(e) => return Ok(ToolResult::failure("", format!("Scan failed: {e}"))),
        };

        let selection = allocate(files, &self.allocation);
        self.event_bus.publish(DomainEvent::ScanCompleted {
            root: args.path,
            files_included: selection.stats.files_included,
            files_path_only: selection.stats.files_path_only,
            estimated_tokens: selection.stats.estimated_tokens,
            timestamp: Utc::now(),
        });

        Ok(ToolResult::ok("", format_selection(&selection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_context::selected_paths;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;

    fn tool() -> ScanWorkspaceTool {
        ScanWorkspaceTool::new(
            ScanOptions::default(),
            AllocationPolicy::default(),
            Arc::new(EventBus::default()),
        )
    }

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn packs_a_workspace_into_context_text() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("package.json"), "{ \"name\": \"acme\" }");
        touch(&tmp.path().join("src/main.rs"), "fn main() {}");

        let result = tool()
            .execute(serde_json::json!({"path": tmp.path().to_str().unwrap()}))
            .await
            .unwrap();

        assert!(result.success);
        let paths = selected_paths(&result.output);
        assert!(paths.contains(&"package.json".to_string()));
        assert!(paths.contains(&"src/main.rs".to_string()));
    }

    #[tokio::test]
    async fn denylisted_tree_pruned_quickly() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("src/main.rs"), "fn main() {}");
        // A large excluded tree; pruned before descent, so the scan
        // stays fast and none of it surfaces.
        for i in 0..500 {
            touch(
                &tmp.path().join(format!("node_modules/dep/file{i}.js")),
                "module.exports = 1;",
            );
        }

        let started = Instant::now();
        let result = tool()
            .execute(serde_json::json!({"path": tmp.path().to_str().unwrap()}))
            .await
            .unwrap();
        assert!(started.elapsed().as_secs() < 5);

        assert!(result.success);
        assert!(!result.output.contains("node_modules"));
    }

    #[tokio::test]
    async fn non_directory_root_is_result_text() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        touch(&file, "just a file");

        let result = tool()
            .execute(serde_json::json!({"path": file.to_str().unwrap()}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Scan failed"));
    }

    #[tokio::test]
    async fn missing_path_argument_rejected() {
        let err = tool().execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn publishes_scan_completed_event() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let tool = ScanWorkspaceTool::new(
            ScanOptions::default(),
            AllocationPolicy::default(),
            bus.clone(),
        );

        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.rs"), "fn a() {}");
        tool.execute(serde_json::json!({"path": tmp.path().to_str().unwrap()}))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.as_ref(),
            DomainEvent::ScanCompleted { files_included: 1, .. }
        ));
    }
}
