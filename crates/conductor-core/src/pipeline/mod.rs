//! Pipeline Graph: the static description of which agents run, in what
//! order, and which of them may run together.
//!
//! ```text
//! pipeline.yaml ──► PipelineDefinition ──► validate()
//!                        │
//!                     stages()
//!                        │
//!   Sequential(research) → Sequential(architecture)
//!        → Parallel("implementation", [frontend, backend])
//!        → Sequential(integration)
//! ```

pub mod graph;
pub mod schema;

pub use graph::Stage;
pub use schema::{AgentSpec, PipelineDefinition};
