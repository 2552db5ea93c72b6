//! Scripted provider — a deterministic backend for loop tests.
//!
//! Responses are served from a queue in order. With `repeat_last`
//! enabled, the final response keeps repeating once the queue drains —
//! that is how tests model a backend that requests tools forever.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use atelier_core::error::ProviderError;
use atelier_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use atelier_core::tool::ToolCallRequest;

pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    repeat_last: Mutex<Option<ProviderResponse>>,
    repeat: bool,
}

impl ScriptedProvider {
    /// A provider that serves `responses` in order and errors once they
    /// run out.
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat_last: Mutex::new(None),
            repeat: false,
        }
    }

    /// Keep serving the last response after the queue drains.
    pub fn with_repeat_last(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// A canned final-text response.
    pub fn text(content: impl Into<String>) -> ProviderResponse {
        ProviderResponse {
            content: content.into(),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            model: "scripted".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        }
    }

    /// A canned tool-call response.
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> ProviderResponse {
        ProviderResponse {
            content: String::new(),
            tool_calls: calls,
            stop_reason: StopReason::ToolUse,
            model: "scripted".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        }
    }

    /// Shorthand for a single-call response.
    pub fn single_tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> ProviderResponse {
        Self::tool_calls(vec![ToolCallRequest {
            id: id.into(),
            name: name.into(),
            arguments,
        }])
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut queue = self.responses.lock().expect("scripted queue poisoned");
        if let Some(response) = queue.pop_front() {
            if self.repeat {
                *self.repeat_last.lock().expect("scripted queue poisoned") =
                    Some(response.clone());
            }
            return Ok(response);
        }
        drop(queue);

        if self.repeat {
            if let Some(last) = self
                .repeat_last
                .lock()
                .expect("scripted queue poisoned")
                .clone()
            {
                return Ok(last);
            }
        }
        Err(ProviderError::NotConfigured(
            "scripted provider exhausted".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::turn::Turn;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "scripted".into(),
            system_prompt: String::new(),
            turns: vec![Turn::user("hi")],
            temperature: 0.0,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn serves_responses_in_order() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::text("first"),
            ScriptedProvider::text("second"),
        ]);
        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().content, "second");
        assert!(provider.complete(request()).await.is_err());
    }

    #[tokio::test]
    async fn repeat_last_never_exhausts() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::single_tool_call(
            "call_1",
            "list_projects",
            serde_json::json!({}),
        )])
        .with_repeat_last();

        for _ in 0..10 {
            let response = provider.complete(request()).await.unwrap();
            assert_eq!(response.stop_reason, StopReason::ToolUse);
            assert_eq!(response.tool_calls.len(), 1);
        }
    }
}
