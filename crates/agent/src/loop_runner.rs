//! The assistant reasoning loop implementation.
//!
//! One invocation drives the multi-turn exchange with the model. The
//! loop is sequential from the caller's perspective: each round strictly
//! waits for the model response, then for every tool execution of that
//! round, before re-entering. Sibling calls within a round run
//! concurrently; their results land in a single transcript turn in
//! request order. The only bound is the round counter — there is no
//! cancellation token, and an in-flight tool execution is always allowed
//! to finish rather than be interrupted mid-transaction.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use atelier_core::event::{DomainEvent, EventBus};
use atelier_core::provider::{Provider, ProviderRequest};

use atelier_tools::Dispatcher;

use crate::transcript::Transcript;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopSignal {
    /// The model produced a final text answer.
    Final { text: String },

    /// The model stopped without text and without requesting tools.
    NoToolCalls,

    /// The round ceiling was hit before a final answer. `partial` is the
    /// last assistant text seen, if any, so the caller can show
    /// "assistant could not finish" alongside it.
    RoundLimitExceeded { partial: Option<String> },
}

/// The orchestration loop: model calls plus tool dispatch under a hard
/// round bound.
pub struct AssistantLoop {
    /// The model backend to exchange turns with
    provider: Arc<dyn Provider>,

    /// The never-throws tool boundary
    dispatcher: Dispatcher,

    /// The model to use
    model: String,

    /// System prompt sent every round
    system_prompt: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per model response
    max_tokens: Option<u32>,

    /// Maximum tool rounds per invocation
    max_rounds: u32,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl AssistantLoop {
    /// Create a new loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: Dispatcher,
        model: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            model: model.into(),
            system_prompt: String::new(),
            temperature: 0.7,
            max_tokens: None,
            max_rounds: 8,
            event_bus,
        }
    }

    /// Set the system prompt sent ahead of the transcript.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool rounds.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Drive the exchange to a termination signal.
    ///
    /// All turns are appended to the transcript in arrival order and the
    /// full transcript is replayed every round. The model is never
    /// called again until every tool call requested in the current round
    /// has a result.
    pub async fn run(
        &self,
        transcript: &mut Transcript,
    ) -> Result<LoopSignal, atelier_core::Error> {
        info!(
            model = %self.model,
            turns = transcript.len(),
            "Starting assistant loop"
        );

        let tool_definitions = self.dispatcher.definitions();
        let mut rounds_completed: u32 = 0;

        loop {
            if rounds_completed >= self.max_rounds {
                warn!(
                    rounds = rounds_completed,
                    "Round ceiling reached without a final answer"
                );
                self.event_bus.publish(DomainEvent::RoundLimitReached {
                    rounds: rounds_completed,
                    timestamp: Utc::now(),
                });
                return Ok(LoopSignal::RoundLimitExceeded {
                    partial: transcript.last_assistant_text().map(String::from),
                });
            }

            let request = ProviderRequest {
                model: self.model.clone(),
                system_prompt: self.system_prompt.clone(),
                turns: transcript.turns().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    model: response.model.clone(),
                    round: rounds_completed,
                    tokens_used: usage.total_tokens,
                    timestamp: Utc::now(),
                });
            }

            if response.tool_calls.is_empty() {
                transcript.push_assistant(response.content.clone(), vec![]);
                if response.content.is_empty() {
                    debug!("Model stopped with neither text nor tool calls");
                    return Ok(LoopSignal::NoToolCalls);
                }
                return Ok(LoopSignal::Final {
                    text: response.content,
                });
            }

            debug!(
                round = rounds_completed,
                tool_count = response.tool_calls.len(),
                "Executing tool calls"
            );

            let calls = response.tool_calls.clone();
            transcript.push_assistant(response.content, calls.clone());

            // Sibling calls run concurrently; join_all keeps request
            // order, and each result carries its own call id.
            let results = futures::future::join_all(calls.iter().map(|call| async {
                let start = std::time::Instant::now();
                let result = self.dispatcher.dispatch(call).await;
                self.event_bus.publish(DomainEvent::ToolExecuted {
                    tool_name: call.name.clone(),
                    success: result.success,
                    duration_ms: start.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });
                result
            }))
            .await;

            transcript.push_tool_results(results);
            rounds_completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::store::{OwnerId, ProjectStore};
    use atelier_core::turn::Turn;
    use atelier_providers::ScriptedProvider;
    use atelier_store::InMemoryStore;
    use atelier_tools::{registry_for, ToolContext};

    fn dispatcher_for(store: Arc<InMemoryStore>, owner: &str) -> Dispatcher {
        let ctx = ToolContext {
            owner: OwnerId::new(owner),
            store,
            scan_options: atelier_context::ScanOptions::default(),
            allocation: atelier_context::AllocationPolicy::default(),
            event_bus: Arc::new(EventBus::default()),
        };
        Dispatcher::new(registry_for(&ctx))
    }

    fn assistant(provider: ScriptedProvider, dispatcher: Dispatcher) -> AssistantLoop {
        AssistantLoop::new(
            Arc::new(provider),
            dispatcher,
            "scripted",
            Arc::new(EventBus::default()),
        )
    }

    #[tokio::test]
    async fn simple_text_response() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("Hello! How can I help?")]);
        let agent = assistant(provider, dispatcher_for(store, "alice"));

        let mut transcript = Transcript::new();
        transcript.push_user("Hello!");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(
            signal,
            LoopSignal::Final {
                text: "Hello! How can I help?".into()
            }
        );
        // User + Assistant
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn three_tool_rounds_then_final() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::single_tool_call("call_1", "list_projects", serde_json::json!({})),
            ScriptedProvider::single_tool_call(
                "call_2",
                "create_project",
                serde_json::json!({"name": "My Project"}),
            ),
            ScriptedProvider::single_tool_call(
                "call_3",
                "get_project",
                serde_json::json!({"key": "my-project"}),
            ),
            ScriptedProvider::text("All set: the project is created."),
        ]);
        let agent = assistant(provider, dispatcher_for(store.clone(), "alice"));

        let mut transcript = Transcript::new();
        transcript.push_user("Set up a project called My Project");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(
            signal,
            LoopSignal::Final {
                text: "All set: the project is created.".into()
            }
        );

        // user + 3 × (assistant + tool-results) + final assistant
        assert_eq!(transcript.len(), 8);
        let dispatch_rounds = transcript
            .turns()
            .iter()
            .filter(|t| matches!(t, Turn::ToolResults { .. }))
            .count();
        assert_eq!(dispatch_rounds, 3);

        // The second round really hit the store.
        let project = store
            .find_project(&OwnerId::new("alice"), "my-project")
            .await
            .unwrap();
        assert!(project.is_some());
    }

    #[tokio::test]
    async fn round_limit_stops_an_endless_tool_caller() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![ScriptedProvider::single_tool_call(
            "call_1",
            "list_projects",
            serde_json::json!({}),
        )])
        .with_repeat_last();

        let agent =
            assistant(provider, dispatcher_for(store, "alice")).with_max_rounds(3);

        let mut transcript = Transcript::new();
        transcript.push_user("loop forever");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(signal, LoopSignal::RoundLimitExceeded { partial: None });

        // Exactly the configured number of dispatch rounds happened.
        let dispatch_rounds = transcript
            .turns()
            .iter()
            .filter(|t| matches!(t, Turn::ToolResults { .. }))
            .count();
        assert_eq!(dispatch_rounds, 3);
    }

    #[tokio::test]
    async fn round_limit_carries_partial_text() {
        let store = Arc::new(InMemoryStore::new());
        let mut with_text =
            ScriptedProvider::single_tool_call("call_1", "list_projects", serde_json::json!({}));
        with_text.content = "Let me check your projects…".into();

        let provider = ScriptedProvider::new(vec![with_text]).with_repeat_last();
        let agent = assistant(provider, dispatcher_for(store, "alice")).with_max_rounds(2);

        let mut transcript = Transcript::new();
        transcript.push_user("hi");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(
            signal,
            LoopSignal::RoundLimitExceeded {
                partial: Some("Let me check your projects…".into())
            }
        );
    }

    #[tokio::test]
    async fn sibling_calls_land_in_one_turn_with_their_ids() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![
                atelier_core::tool::ToolCallRequest {
                    id: "call_a".into(),
                    name: "list_projects".into(),
                    arguments: serde_json::json!({}),
                },
                atelier_core::tool::ToolCallRequest {
                    id: "call_b".into(),
                    name: "get_project".into(),
                    arguments: serde_json::json!({"key": "ghost"}),
                },
            ]),
            ScriptedProvider::text("done"),
        ]);
        let agent = assistant(provider, dispatcher_for(store, "alice"));

        let mut transcript = Transcript::new();
        transcript.push_user("do both");
        agent.run(&mut transcript).await.unwrap();

        let results_turn = transcript
            .turns()
            .iter()
            .find_map(|t| match t {
                Turn::ToolResults { results } => Some(results),
                _ => None,
            })
            .expect("one tool-results turn");
        assert_eq!(results_turn.len(), 2);
        assert_eq!(results_turn[0].call_id, "call_a");
        assert_eq!(results_turn[1].call_id, "call_b");
        // The miss is text, not a fault.
        assert!(!results_turn[1].success);
        assert!(results_turn[1].output.contains("No project found"));
    }

    #[tokio::test]
    async fn empty_response_is_no_tool_calls_signal() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("")]);
        let agent = assistant(provider, dispatcher_for(store, "alice"));

        let mut transcript = Transcript::new();
        transcript.push_user("…");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(signal, LoopSignal::NoToolCalls);
    }

    #[tokio::test]
    async fn unknown_tool_feeds_text_back_instead_of_failing() {
        let store = Arc::new(InMemoryStore::new());
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::single_tool_call("call_1", "drop_database", serde_json::json!({})),
            ScriptedProvider::text("understood"),
        ]);
        let agent = assistant(provider, dispatcher_for(store, "alice"));

        let mut transcript = Transcript::new();
        transcript.push_user("try something weird");

        let signal = agent.run(&mut transcript).await.unwrap();
        assert_eq!(signal, LoopSignal::Final { text: "understood".into() });

        let results = transcript
            .turns()
            .iter()
            .find_map(|t| match t {
                Turn::ToolResults { results } => Some(results),
                _ => None,
            })
            .unwrap();
        assert!(results[0].output.contains("Unknown tool"));
    }
}
