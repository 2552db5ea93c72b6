//! The orchestration loop — the heart of the Atelier assistant.
//!
//! Each invocation runs a bounded cycle:
//!
//! 1. **Send** the full transcript plus tool definitions to the model
//! 2. **If tool calls**: execute every requested call, append all
//!    results as one turn, loop back to step 1
//! 3. **If text**: return it as the final answer
//!
//! A fixed round ceiling guarantees termination even against a model
//! that requests tools forever. Transcripts are built fresh per
//! invocation and discarded at its end; the domain store is the only
//! durable shared resource.

pub mod loop_runner;
pub mod opening;
pub mod transcript;

pub use loop_runner::{AssistantLoop, LoopSignal};
pub use opening::workspace_opening;
pub use transcript::Transcript;
