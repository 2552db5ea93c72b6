//! Get-project tool — owner-scoped lookup by key with a summary of the
//! project's sprints and tasks.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use atelier_core::error::ToolError;
use atelier_core::store::{OwnerId, ProjectStore};
use atelier_core::tool::{Tool, ToolResult};

use crate::{decode_args, miss};

#[derive(Debug, Deserialize)]
struct GetProjectArgs {
    key: String,
}

pub struct GetProjectTool {
    owner: OwnerId,
    store: Arc<dyn ProjectStore>,
}

impl GetProjectTool {
    pub fn new(owner: OwnerId, store: Arc<dyn ProjectStore>) -> Self {
        Self { owner, store }
    }
}

#[async_trait]
impl Tool for GetProjectTool {
    fn name(&self) -> &str {
        "get_project"
    }

    fn description(&self) -> &str {
        "Look up a project by its key and summarize its sprints and tasks."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "The project key, e.g. 'acme-redesign'"
                }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: GetProjectArgs = decode_args(self.name(), arguments)?;

        let project = self
            .store
            .find_project(&self.owner, &args.key)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        let Some(project) = project else {
            return Ok(ToolResult::failure("", miss("project", &args.key)));
        };

        let sprints = self
            .store
            .sprints_for(&self.owner, &project.id)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        let mut out = format!("Project '{}' (key: {})\n", project.name, project.slug);
        if let Some(description) = &project.description {
            out.push_str(&format!("Description: {description}\n"));
        }
        out.push_str(&format!("Sprints: {}\n", sprints.len()));
        for sprint in &sprints {
            let tasks = self
                .store
                .tasks_for(&self.owner, &sprint.id)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: self.name().into(),
                    reason: e.to_string(),
                })?;
            out.push_str(&format!(
                "  {}. {} — {} task(s)\n",
                sprint.number,
                sprint.name,
                tasks.len()
            ));
        }

        Ok(ToolResult::ok("", out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context_for;
    use atelier_core::store::{ProjectDraft, SprintDraft, TaskDraft};

    async fn seed(ctx: &crate::ToolContext) {
        ctx.store
            .create_project(
                &ctx.owner,
                ProjectDraft {
                    name: "Acme Redesign".into(),
                    description: Some("Full site refresh".into()),
                    sprints: vec![SprintDraft {
                        name: "Discovery".into(),
                        tasks: vec![TaskDraft { title: "Audit".into() }],
                    }],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn summarizes_owned_project() {
        let ctx = context_for("alice");
        seed(&ctx).await;
        let tool = GetProjectTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"key": "acme-redesign"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("Acme Redesign"));
        assert!(result.output.contains("Full site refresh"));
        assert!(result.output.contains("1. Discovery — 1 task(s)"));
    }

    #[tokio::test]
    async fn unknown_key_is_generic_miss() {
        let ctx = context_for("alice");
        let tool = GetProjectTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"key": "nope"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "No project found matching 'nope'.");
    }

    #[tokio::test]
    async fn other_owners_key_is_the_same_generic_miss() {
        let ctx = context_for("alice");
        seed(&ctx).await;

        // Bob's tool over the same store: a valid key he doesn't own
        // reads exactly like a nonexistent one.
        let bob_tool = GetProjectTool::new(OwnerId::new("bob"), ctx.store.clone());
        let stolen = bob_tool
            .execute(serde_json::json!({"key": "acme-redesign"}))
            .await
            .unwrap();
        let missing = bob_tool
            .execute(serde_json::json!({"key": "never-existed"}))
            .await
            .unwrap();

        assert!(!stolen.success);
        assert_eq!(
            stolen.output.replace("acme-redesign", "{key}"),
            missing.output.replace("never-existed", "{key}"),
        );
    }
}
