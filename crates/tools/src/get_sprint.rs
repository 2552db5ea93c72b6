//! Get-sprint tool — a parent-then-child lookup chain.
//!
//! Resolves a project by key, then a sprint by number within it. The
//! chain fails with descriptive text at the first missing link so the
//! model can retry with corrected arguments.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use atelier_core::error::ToolError;
use atelier_core::store::{OwnerId, ProjectStore};
use atelier_core::tool::{Tool, ToolResult};

use crate::{decode_args, miss};

#[derive(Debug, Deserialize)]
struct GetSprintArgs {
    project_key: String,
    sprint_number: u32,
}

pub struct GetSprintTool {
    owner: OwnerId,
    store: Arc<dyn ProjectStore>,
}

impl GetSprintTool {
    pub fn new(owner: OwnerId, store: Arc<dyn ProjectStore>) -> Self {
        Self { owner, store }
    }

    fn fault(&self, e: impl std::fmt::Display) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Tool for GetSprintTool {
    fn name(&self) -> &str {
        "get_sprint"
    }

    fn description(&self) -> &str {
        "Look up a sprint by project key and sprint number, listing its tasks."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "project_key": {
                    "type": "string",
                    "description": "The key of the project the sprint belongs to"
                },
                "sprint_number": {
                    "type": "integer",
                    "description": "1-based sprint number within the project"
                }
            },
            "required": ["project_key", "sprint_number"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: GetSprintArgs = decode_args(self.name(), arguments)?;

        let project = self
            .store
            .find_project(&self.owner, &args.project_key)
            .await
            .map_err(|e| self.fault(e))?;
        let Some(project) = project else {
            return Ok(ToolResult::failure("", miss("project", &args.project_key)));
        };

        let sprint = self
            .store
            .find_sprint(&self.owner, &project.id, args.sprint_number)
            .await
            .map_err(|e| self.fault(e))?;
        let Some(sprint) = sprint else {
            return Ok(ToolResult::failure(
                "",
                format!(
                    "Project '{}' has no sprint {}.",
                    project.slug, args.sprint_number
                ),
            ));
        };

        let tasks = self
            .store
            .tasks_for(&self.owner, &sprint.id)
            .await
            .map_err(|e| self.fault(e))?;

        let mut out = format!(
            "Sprint {} '{}' of project '{}'\n",
            sprint.number, sprint.name, project.slug
        );
        if tasks.is_empty() {
            out.push_str("No tasks.\n");
        } else {
            for task in &tasks {
                out.push_str(&format!("- [{}] {}\n", task.status, task.title));
            }
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
                    name: "Launch".into(),
                    description: None,
                    sprints: vec![SprintDraft {
                        name: "Ship".into(),
                        tasks: vec![TaskDraft { title: "Deploy".into() }],
                    }],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resolves_full_chain() {
        let ctx = context_for("alice");
        seed(&ctx).await;
        let tool = GetSprintTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"project_key": "launch", "sprint_number": 1}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("Sprint 1 'Ship'"));
        assert!(result.output.contains("[todo] Deploy"));
    }

    #[tokio::test]
    async fn missing_project_fails_first_link() {
        let ctx = context_for("alice");
        let tool = GetSprintTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"project_key": "ghost", "sprint_number": 1}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "No project found matching 'ghost'.");
    }

    #[tokio::test]
    async fn missing_sprint_fails_second_link() {
        let ctx = context_for("alice");
        seed(&ctx).await;
        let tool = GetSprintTool::new(ctx.owner.clone(), ctx.store.clone());

        let result = tool
            .execute(serde_json::json!({"project_key": "launch", "sprint_number": 7}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("no sprint 7"));
    }

    #[tokio::test]
    async fn wrong_argument_type_rejected() {
        let ctx = context_for("alice");
        let tool = GetSprintTool::new(ctx.owner.clone(), ctx.store.clone());

        let err = tool
            .execute(serde_json::json!({"project_key": "launch", "sprint_number": "one"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
