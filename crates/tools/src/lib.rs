//! Tool implementations for the Atelier assistant.
//!
//! Every tool is constructed bound to the calling workspace's `OwnerId`
//! and a shared store handle; the model addresses records by
//! human-readable keys, and every lookup inside a tool is owner-scoped.
//! Argument payloads are decoded into typed serde structs at the top of
//! each `execute` — a malformed shape becomes an `InvalidArguments`
//! rejection the model can retry, never a runtime assumption.

pub mod create_note;
pub mod create_project;
pub mod dispatcher;
pub mod get_project;
pub mod get_sprint;
pub mod list_projects;
pub mod scan_workspace;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use atelier_context::{AllocationPolicy, ScanOptions};
use atelier_core::error::ToolError;
use atelier_core::event::EventBus;
use atelier_core::store::{OwnerId, ProjectStore};
use atelier_core::tool::ToolRegistry;

pub use dispatcher::Dispatcher;

/// Everything a tool set needs: the caller identity, the store, the
/// scan/packing policy, and the event bus.
#[derive(Clone)]
pub struct ToolContext {
    pub owner: OwnerId,
    pub store: Arc<dyn ProjectStore>,
    pub scan_options: ScanOptions,
    pub allocation: AllocationPolicy,
    pub event_bus: Arc<EventBus>,
}

/// Build the full tool registry for one caller.
pub fn registry_for(ctx: &ToolContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(create_project::CreateProjectTool::new(
        ctx.owner.clone(),
        ctx.store.clone(),
    )));
    registry.register(Box::new(get_project::GetProjectTool::new(
        ctx.owner.clone(),
        ctx.store.clone(),
    )));
    registry.register(Box::new(list_projects::ListProjectsTool::new(
        ctx.owner.clone(),
        ctx.store.clone(),
    )));
    registry.register(Box::new(get_sprint::GetSprintTool::new(
        ctx.owner.clone(),
        ctx.store.clone(),
    )));
    registry.register(Box::new(create_note::CreateNoteTool::new(
        ctx.owner.clone(),
        ctx.store.clone(),
    )));
    registry.register(Box::new(scan_workspace::ScanWorkspaceTool::new(
        ctx.scan_options.clone(),
        ctx.allocation.clone(),
        ctx.event_bus.clone(),
    )));
    registry
}

/// Decode tool arguments into the tool's typed shape.
///
/// A missing payload (JSON null) is treated as an empty object so
/// zero-argument tools accept both forms backends send.
pub(crate) fn decode_args<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

/// The one miss message for every lookup. Identical whether the record
/// doesn't exist or belongs to someone else, so ownership never leaks
/// through error shape.
pub(crate) fn miss(kind: &str, key: &str) -> String {
    format!("No {kind} found matching '{key}'.")
}
