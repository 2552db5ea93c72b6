//! The dispatcher — the never-throws boundary below the loop.
//!
//! Every fault a tool can produce (unknown name, bad argument shape,
//! store error) is converted to result text here. Invalid input and
//! lookup misses carry actionable messages so the model can retry;
//! unexpected faults are logged for operators and replaced with a
//! generic line that leaks no internal detail.

use tracing::{debug, warn};

use atelier_core::error::ToolError;
use atelier_core::provider::ToolDefinition;
use atelier_core::tool::{ToolCallRequest, ToolRegistry, ToolResult};

/// Generic text for unexpected execution faults. Detail stays in the logs.
const GENERIC_FAILURE: &str = "The operation could not be completed. Please try again.";

pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Tool definitions for the model, in stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Execute one call. Always returns a result echoing the call id;
    /// never an error.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolResult {
        debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
        match self.registry.execute(call).await {
            Ok(result) => result,
            Err(ToolError::NotFound(name)) => {
                ToolResult::failure(&call.id, format!("Unknown tool '{name}'."))
            }
            Err(ToolError::InvalidArguments(reason)) => {
                ToolResult::failure(&call.id, format!("Invalid arguments: {reason}"))
            }
            Err(ToolError::ExecutionFailed { tool_name, reason }) => {
                warn!(tool = %tool_name, error = %reason, "Tool execution fault");
                ToolResult::failure(&call.id, GENERIC_FAILURE)
            }
        }
    }
}
