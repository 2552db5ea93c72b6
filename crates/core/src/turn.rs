//! Transcript turns — the value objects a conversation is made of.
//!
//! A turn is one atomic entry in the exchange with the model: the user's
//! opening message, an assistant reply (possibly carrying tool-call
//! requests), or the batch of tool results produced for one round. All
//! results of a round land in a single `ToolResults` turn so the model
//! sees them together on replay.

use serde::{Deserialize, Serialize};

use crate::tool::{ToolCallRequest, ToolResult};

/// One entry in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// A message from the end user (or an injected opening context).
    User { content: String },

    /// An assistant reply. `tool_calls` is empty for plain text replies.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },

    /// The results for every tool call requested in one round.
    ToolResults { results: Vec<ToolResult> },
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// The textual content of this turn, if it has any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::User { content } | Self::Assistant { content, .. } => Some(content.as_str()),
            Self::ToolResults { .. } => None,
        }
    }
}
