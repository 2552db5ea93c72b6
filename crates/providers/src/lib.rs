//! Model backend implementations for the Atelier assistant.
//!
//! - `OpenAiCompatProvider` — HTTP client for any OpenAI-compatible
//!   `/chat/completions` endpoint (OpenAI, OpenRouter, vLLM, Ollama, …)
//! - `ScriptedProvider` — deterministic canned-response backend for
//!   orchestration-loop tests

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;
