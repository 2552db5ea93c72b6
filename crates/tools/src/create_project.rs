//! Create-project tool — atomic hierarchy creation.
//!
//! The model supplies a project name and optionally nested sprints with
//! tasks. The whole hierarchy is handed to the store as one draft and
//! committed atomically there; this tool never sees a partial write.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use atelier_core::error::{StoreError, ToolError};
use atelier_core::store::{OwnerId, ProjectDraft, ProjectStore, SprintDraft, TaskDraft};
use atelier_core::tool::{Tool, ToolResult};

use crate::decode_args;

#[derive(Debug, Deserialize)]
struct CreateProjectArgs {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sprints: Vec<SprintArgs>,
}

#[derive(Debug, Deserialize)]
struct SprintArgs {
    name: String,
    #[serde(default)]
    tasks: Vec<TaskArgs>,
}

#[derive(Debug, Deserialize)]
struct TaskArgs {
    title: String,
}

pub struct CreateProjectTool {
    owner: OwnerId,
    store: Arc<dyn ProjectStore>,
}

impl CreateProjectTool {
    pub fn new(owner: OwnerId, store: Arc<dyn ProjectStore>) -> Self {
        Self { owner, store }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &str {
        "create_project"
    }

    fn description(&self) -> &str {
        "Create a new project, optionally with sprints and tasks. \
         Returns the project's key for later lookups."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Project name (free text; the key is derived from it)"
                },
                "description": {
                    "type": "string",
                    "description": "Optional project description"
                },
                "sprints": {
                    "type": "array",
                    "description": "Sprints to create with the project, in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "tasks": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "title": { "type": "string" }
                                    },
                                    "required": ["title"]
                                }
                            }
                        },
                        "required": ["name"]
                    }
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: CreateProjectArgs = decode_args(self.name(), arguments)?;

        let sprint_count = args.sprints.len();
        let task_count: usize = args.sprints.iter().map(|s| s.tasks.len()).sum();

        let draft = ProjectDraft {
            name: args.name,
            description: args.description,
            sprints: args
                .sprints
                .into_iter()
                .map(|s| SprintDraft {
                    name: s.name,
                    tasks: s.tasks.into_iter().map(|t| TaskDraft { title: t.title }).collect(),
                })
                .collect(),
        };

        match self.store.create_project(&self.owner, draft).await {
            Ok(project) => Ok(ToolResult::ok(
                "",
                format!(
                    "Created project '{}' (key: {}) with {} sprint(s) and {} task(s).",
                    project.name, project.slug, sprint_count, task_count
                ),
            )),
            // Draft validation messages are safe and actionable; let the
            // model correct its arguments.
            Err(StoreError::InvalidDraft(reason)) => Ok(ToolResult::failure(
                "",
                format!("Could not create the project: {reason}"),
            )),
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            }),
        }
    }
}
