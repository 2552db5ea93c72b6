//! Create-note tool — files a note into an owned folder.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use atelier_core::error::{StoreError, ToolError};
use atelier_core::store::{NoteDraft, OwnerId, ProjectStore};
use atelier_core::tool::{Tool, ToolResult};

use crate::{decode_args, miss};

#[derive(Debug, Deserialize)]
struct CreateNoteArgs {
    folder: String,
    title: String,
    #[serde(default)]
    body: String,
}

pub struct CreateNoteTool {
    owner: OwnerId,
    store: Arc<dyn ProjectStore>,
}

impl CreateNoteTool {
    pub fn new(owner: OwnerId, store: Arc<dyn ProjectStore>) -> Self {
        Self { owner, store }
    }
}

#[async_trait]
impl Tool for CreateNoteTool {
    fn name(&self) -> &str {
        "create_note"
    }

    fn description(&self) -> &str {
        "Create a note in one of the caller's folders, addressed by folder key."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "folder": {
                    "type": "string",
                    "description": "Key of the folder to file the note in"
                },
                "title": { "type": "string" },
                "body": { "type": "string" }
            },
            "required": ["folder", "title"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: CreateNoteArgs = decode_args(self.name(), arguments)?;

        // Parent first: the folder must resolve under this owner before
        // any write happens.
        let folder = self
            .store
            .find_folder(&self.owner, &args.folder)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;
        let Some(folder) = folder else {
            return Ok(ToolResult::failure("", miss("folder", &args.folder)));
        };

        match self
            .store
            .create_note(
                &self.owner,
                &folder.id,
                NoteDraft {
                    title: args.title,
                    body: args.body,
                },
            )
            .await
        {
            Ok(note) => Ok(ToolResult::ok(
                "",
                format!("Created note '{}' in folder '{}'.", note.title, folder.slug),
            )),
            Err(StoreError::InvalidDraft(reason)) => Ok(ToolResult::failure(
                "",
                format!("Could not create the note: {reason}"),
            )),
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context_for;

    #[tokio::test]
    async fn files_note_into_owned_folder() {
        let ctx = context_for("alice");
        ctx.store.create_folder(&ctx.owner, "Client Notes").await.unwrap();
        let tool = CreateNoteTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({
                "folder": "client-notes",
                "title": "Kickoff",
                "body": "Discussed timeline"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("Kickoff"));
        assert!(result.output.contains("client-notes"));
    }

    #[tokio::test]
    async fn unknown_folder_is_generic_miss() {
        let ctx = context_for("alice");
        let tool = CreateNoteTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"folder": "ghost", "title": "x"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "No folder found matching 'ghost'.");
    }

    #[tokio::test]
    async fn someone_elses_folder_is_the_same_miss() {
        let ctx = context_for("alice");
        ctx.store.create_folder(&ctx.owner, "Private").await.unwrap();

        let bob_tool = CreateNoteTool::new(OwnerId::new("bob"), ctx.store.clone());
        let result = bob_tool
            .execute(serde_json::json!({"folder": "private", "title": "peek"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "No folder found matching 'private'.");
    }

    #[tokio::test]
    async fn empty_title_is_textual_failure() {
        let ctx = context_for("alice");
        ctx.store.create_folder(&ctx.owner, "Notes").await.unwrap();
        let tool = CreateNoteTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"folder": "notes", "title": "  "}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Could not create the note"));
    }
}
