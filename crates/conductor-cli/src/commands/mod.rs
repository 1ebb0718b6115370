//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level command. They all share the
//! global `Settings`, which turns flags into an `OrchestratorConfig` and a
//! `PipelineDefinition`.

pub mod agent;
pub mod clean;
pub mod env;
pub mod run;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use conductor_core::config::{OrchestratorConfig, TransportSettings};
use conductor_core::{Orchestrator, PipelineDefinition, ProviderRegistry};

/// Flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory the agents' JSON artifacts are written to
    #[arg(long, global = true, env = "CONDUCTOR_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Directory holding the prompt documents
    #[arg(long, global = true, env = "CONDUCTOR_PROMPTS_DIR", default_value = "prompts")]
    pub prompts_dir: PathBuf,

    /// Pipeline YAML file (defaults to the built-in five-agent pipeline)
    #[arg(long, global = true, env = "CONDUCTOR_PIPELINE")]
    pub pipeline: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "CONDUCTOR_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Retries after a failed attempt (connection errors and 5xx only)
    #[arg(long, global = true, env = "CONDUCTOR_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, global = true, env = "CONDUCTOR_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Double the retry delay after every attempt
    #[arg(long, global = true)]
    pub exponential_backoff: bool,
}

impl Settings {
    /// Configuration for this process: flags plus credentials and endpoints
    /// from the environment.
    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            artifacts_dir: self.artifacts_dir.clone(),
            prompts_dir: self.prompts_dir.clone(),
            transport: TransportSettings {
                timeout: Duration::from_secs(self.timeout_secs),
                max_retries: self.max_retries,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                exponential_backoff: self.exponential_backoff,
            },
            ..OrchestratorConfig::from_env()
        }
    }

    pub fn load_pipeline(&self) -> Result<PipelineDefinition, String> {
        match &self.pipeline {
            Some(path) => {
                let definition = PipelineDefinition::from_file(path).map_err(|e| e.to_string())?;
                tracing::debug!("[CLI] Loaded pipeline '{}' from {}", definition.name, path);
                Ok(definition)
            }
            None => Ok(PipelineDefinition::builtin()),
        }
    }

    /// Orchestrator wired to the real HTTP adapters.
    pub fn orchestrator(&self) -> Result<Orchestrator, String> {
        let pipeline = self.load_pipeline()?;
        Orchestrator::from_config(pipeline, Arc::new(self.config())).map_err(|e| e.to_string())
    }

    /// Orchestrator with no adapters, for commands that never call a provider.
    pub fn offline_orchestrator(&self) -> Result<Orchestrator, String> {
        let pipeline = self.load_pipeline()?;
        Orchestrator::new(pipeline, Arc::new(self.config()), ProviderRegistry::new())
            .map_err(|e| e.to_string())
    }
}

/// Load `.env.local` then `.env` from the working directory.
pub fn load_dotenv() -> Vec<PathBuf> {
    load_dotenv_from(Path::new("."))
}

/// Load `.env.local` then `.env` from `dir`. Variables already set are never
/// overridden, so `.env.local` wins over `.env`. Returns the files loaded.
///
/// Runs before tracing is installed, so callers log the result themselves.
pub fn load_dotenv_from(dir: &Path) -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    for file in [".env.local", ".env"] {
        let path = dir.join(file);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(path),
            Err(e) if e.not_found() => {}
            Err(e) => eprintln!("Warning: could not load {}: {}", path.display(), e),
        }
    }
    loaded
}

/// Format a duration as seconds with one decimal.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
