//! The transcript — an append-only turn log.
//!
//! The whole transcript is replayed to the model every round; there is
//! no windowing or summarization, deliberately. Loop control flow only
//! touches this small surface, so a windowed or summarized strategy can
//! be substituted later without changing the loop itself.

use atelier_core::tool::{ToolCallRequest, ToolResult};
use atelier_core::turn::Turn;

/// An ordered, append-only list of turns. Existing turns are never
/// rewritten.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Start a transcript from an opening turn (e.g. a packed workspace
    /// context).
    pub fn opening(turn: Turn) -> Self {
        Self { turns: vec![turn] }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append an assistant turn, with whatever tool calls it carried.
    pub fn push_assistant(&mut self, content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) {
        self.turns.push(Turn::Assistant {
            content: content.into(),
            tool_calls,
        });
    }

    /// Append one round's tool results as a single turn.
    pub fn push_tool_results(&mut self, results: Vec<ToolResult>) {
        self.turns.push(Turn::ToolResults { results });
    }

    /// The full ordered turn list, replayed every round.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent assistant text, if any — the loop's "partial
    /// final text" when the round ceiling cuts a conversation short.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::Assistant { content, .. } if !content.is_empty() => Some(content.as_str()),
            _ => None,
        })
    }
}
