//! List-projects tool — the caller's projects, newest first.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use atelier_core::error::ToolError;
use atelier_core::store::{OwnerId, ProjectStore};
use atelier_core::tool::{Tool, ToolResult};

use crate::decode_args;

#[derive(Debug, Default, Deserialize)]
struct ListProjectsArgs {}

pub struct ListProjectsTool {
    owner: OwnerId,
    store: Arc<dyn ProjectStore>,
}

impl ListProjectsTool {
    pub fn new(owner: OwnerId, store: Arc<dyn ProjectStore>) -> Self {
        Self { owner, store }
    }
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn name(&self) -> &str {
        "list_projects"
    }

    fn description(&self) -> &str {
        "List all of the caller's projects with their keys, newest first."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let _args: ListProjectsArgs = decode_args(self.name(), arguments)?;

        let projects = self
            .store
            .list_projects(&self.owner)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        if projects.is_empty() {
            return Ok(ToolResult::ok("", "No projects yet."));
        }

        let mut out = format!("{} project(s):\n", projects.len());
        for project in &projects {
            out.push_str(&format!("- {} (key: {})\n", project.name, project.slug));
        }
        Ok(ToolResult::ok("", out))
    }
}
