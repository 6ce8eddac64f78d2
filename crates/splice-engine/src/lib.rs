//! Insertion orchestration for Splice.
//!
//! Wires the generation backend, context gathering and the reconciliation
//! engine into the inline-completion and optimize flows.

pub mod llm;
pub mod orchestrator;
pub mod progress;
pub mod prompts;

pub use llm::OpenRouterClient;
pub use orchestrator::{Collaborators, InsertionOrchestrator, OrchestratorOptions};
pub use progress::ProgressTicker;
