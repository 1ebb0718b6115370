//! Conductor Core: the multi-agent pipeline engine.
//!
//! A pipeline is a declared list of agents, each bound to one generative
//! model provider. The orchestrator runs them in declaration order, fans out
//! parallel groups, feeds earlier artifacts into later prompts and persists
//! every reply as a JSON artifact.
//!
//! ```text
//! Orchestrator ──► PromptLoader + ArtifactStore (inputs)
//!      │
//!      ├──► ProviderRegistry ──► Gemini / OpenAI / Anthropic ──► ResilientTransport
//!      │
//!      └──► decode() ──► metadata ──► ArtifactStore (output)
//! ```
//!
//! The crate has no CLI dependency; `conductor-cli` is a thin shell over it.

pub mod config;
pub mod decode;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod transport;

// Convenience re-exports
pub use config::OrchestratorConfig;
pub use error::{PipelineError, StepFailure, StoreError, TransportError};
pub use orchestrator::{AgentStatus, Orchestrator, RunReport, StepOutcome};
pub use pipeline::{AgentSpec, PipelineDefinition, Stage};
pub use providers::{GenerateRequest, ModelProvider, Provider, ProviderRegistry};
pub use store::ArtifactStore;
