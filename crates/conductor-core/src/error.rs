//! Error taxonomy for the Conductor pipeline.
//!
//! `PipelineError` is what a single step can fail with. The orchestrator
//! wraps it in a `StepFailure` so the caller always knows which agent
//! aborted the run.

use std::time::Duration;

use crate::providers::Provider;

/// Failure of the Artifact Store (or of loading a prompt from disk).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("IO error on '{reference}': {detail}")]
    Io { reference: String, detail: String },

    #[error("Invalid JSON in '{reference}': {detail}")]
    Serialization { reference: String, detail: String },
}

/// Network-level failure reported by the transport, before any response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{provider} credential missing: set {env_var}")]
    MissingCredential {
        provider: Provider,
        env_var: &'static str,
    },

    #[error("agent '{agent_id}' requires artifact '{artifact}', which does not exist")]
    MissingDependency { agent_id: String, artifact: String },

    #[error("{provider} request timed out after {timeout:?}")]
    Timeout { provider: Provider, timeout: Duration },

    #[error("{provider} transport failure: {detail}")]
    TransportFailure { provider: Provider, detail: String },

    #[error(
        "{provider} API error{}: {message}",
        status.map(|s| format!(" ({})", s)).unwrap_or_default()
    )]
    ProviderError {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: Provider },

    #[error("prompt '{0}' could not be read")]
    PromptNotFound(String),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Stable, user-facing name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingCredential { .. } => "MissingCredential",
            PipelineError::MissingDependency { .. } => "MissingDependency",
            PipelineError::Timeout { .. } => "Timeout",
            PipelineError::TransportFailure { .. } => "TransportFailure",
            PipelineError::ProviderError { .. } => "ProviderError",
            PipelineError::EmptyResponse { .. } => "EmptyResponse",
            PipelineError::PromptNotFound(_) => "PromptNotFound",
            PipelineError::InvalidPipeline(_) => "InvalidPipeline",
            PipelineError::Store(_) => "StoreError",
        }
    }

    pub(crate) fn from_transport(provider: Provider, err: TransportError) -> Self {
        match err {
            TransportError::Timeout(timeout) => PipelineError::Timeout { provider, timeout },
            TransportError::Connection(detail) => {
                PipelineError::TransportFailure { provider, detail }
            }
        }
    }
}

/// A step that aborted the run: which agent, and why.
#[derive(Debug, thiserror::Error)]
#[error("step '{agent_id}' failed [{}]: {error}", error.kind())]
pub struct StepFailure {
    pub agent_id: String,
    #[source]
    pub error: PipelineError,
}

impl StepFailure {
    pub fn new(agent_id: impl Into<String>, error: PipelineError) -> Self {
        Self {
            agent_id: agent_id.into(),
            error,
        }
    }
}
