//! Orchestrator: walks the pipeline stages and turns each agent's prompt
//! into a persisted artifact.
//!
//! Per agent:
//! 1. Check every input artifact exists (fail fast, no network call)
//! 2. Load the prompt document and append each input artifact
//! 3. Call the provider adapter for the agent's provider
//! 4. Decode the reply (never fails) and stamp `metadata`
//! 5. Write the output artifact
//!
//! Parallel groups fan out inside the current task with `join_all`; every
//! member is allowed to settle before the first failure is reported.

pub mod prompt;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;

use crate::config::OrchestratorConfig;
use crate::decode;
use crate::error::{PipelineError, StepFailure};
use crate::pipeline::{AgentSpec, PipelineDefinition, Stage};
use crate::providers::{GenerateRequest, ProviderRegistry};
use crate::store::ArtifactStore;
use crate::transport::ResilientTransport;

pub use prompt::{render_prompt, PromptLoader};

/// Outcome of one completed agent.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub agent_id: String,
    pub artifact: String,
    pub path: PathBuf,
    pub model: String,
    pub duration: Duration,
    /// The reply was not JSON and was stored as the raw-text sentinel
    pub parse_error: bool,
}

/// Summary of a successful `run`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub pipeline: String,
    pub steps: Vec<StepOutcome>,
    pub duration: Duration,
}

impl RunReport {
    /// Artifact written by the last agent in declaration order.
    pub fn final_artifact(&self) -> Option<&PathBuf> {
        self.steps.last().map(|s| &s.path)
    }
}

/// Completion state of one agent, derived from its artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub id: String,
    pub display_name: String,
    pub artifact: PathBuf,
    pub complete: bool,
}

pub struct Orchestrator {
    pipeline: PipelineDefinition,
    config: Arc<OrchestratorConfig>,
    registry: ProviderRegistry,
    store: ArtifactStore,
    prompts: PromptLoader,
}

impl Orchestrator {
    /// Validate `pipeline` and bind it to a configuration and a set of adapters.
    pub fn new(
        pipeline: PipelineDefinition,
        config: Arc<OrchestratorConfig>,
        registry: ProviderRegistry,
    ) -> Result<Self, PipelineError> {
        pipeline.validate()?;
        Ok(Self {
            store: ArtifactStore::new(&config.artifacts_dir),
            prompts: PromptLoader::new(&config.prompts_dir),
            pipeline,
            config,
            registry,
        })
    }

    /// Orchestrator with the HTTP adapters over a `reqwest` transport.
    pub fn from_config(
        pipeline: PipelineDefinition,
        config: Arc<OrchestratorConfig>,
    ) -> Result<Self, PipelineError> {
        let transport = ResilientTransport::reqwest(config.transport.retry_policy());
        let registry = ProviderRegistry::from_config(&config, transport);
        Self::new(pipeline, config, registry)
    }

    pub fn pipeline(&self) -> &PipelineDefinition {
        &self.pipeline
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Execute every stage in order. Stops at the first failed stage.
    pub async fn run(&self) -> Result<RunReport, StepFailure> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let stages = self.pipeline.stages();

        tracing::info!(
            "[Orchestrator] Run {} started: '{}' ({} agents, {} stages)",
            run_id,
            self.pipeline.name,
            self.pipeline.agents.len(),
            stages.len()
        );

        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║  Conductor Pipeline                                      ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║  Pipeline : {:<44} ║", truncate(&self.pipeline.name, 44));
        println!("║  Agents   : {:<44} ║", self.pipeline.agents.len());
        println!("║  Run      : {:<44} ║", truncate(&run_id, 44));
        println!("╚══════════════════════════════════════════════════════════╝");
        println!();

        let mut steps = Vec::with_capacity(self.pipeline.agents.len());

        for (i, stage) in stages.iter().enumerate() {
            println!("── Stage {}/{}: {} ──", i + 1, stages.len(), stage.label());

            match stage {
                Stage::Sequential(agent) => {
                    let outcome = self
                        .execute_agent(agent)
                        .await
                        .map_err(|e| self.fail(agent, e))?;
                    steps.push(outcome);
                }
                Stage::Parallel { group, agents } => {
                    tracing::info!(
                        "[Orchestrator] Fan-out '{}' with {} agents",
                        group,
                        agents.len()
                    );
                    let results = join_all(agents.iter().map(|agent| async move {
                        (*agent, self.execute_agent(agent).await)
                    }))
                    .await;

                    let mut first_failure = None;
                    for (agent, result) in results {
                        match result {
                            Ok(outcome) => steps.push(outcome),
                            Err(e) if first_failure.is_none() => {
                                first_failure = Some(self.fail(agent, e))
                            }
                            Err(e) => tracing::error!(
                                "[Orchestrator] Agent '{}' also failed: {}",
                                agent.id,
                                e
                            ),
                        }
                    }
                    if let Some(failure) = first_failure {
                        return Err(failure);
                    }
                    tracing::info!("[Orchestrator] Joined '{}'", group);
                }
            }
            println!();
        }

        let report = RunReport {
            run_id,
            pipeline: self.pipeline.name.clone(),
            steps,
            duration: started.elapsed(),
        };
        tracing::info!(
            "[Orchestrator] Run {} completed in {:.1}s",
            report.run_id,
            report.duration.as_secs_f64()
        );
        Ok(report)
    }

    /// Execute a single agent by id, outside of a full run.
    pub async fn run_agent(&self, agent_id: &str) -> Result<StepOutcome, StepFailure> {
        let agent = self.pipeline.agent(agent_id).ok_or_else(|| {
            StepFailure::new(
                agent_id,
                PipelineError::InvalidPipeline(format!(
                    "unknown agent '{}'; known agents: {}",
                    agent_id,
                    self.pipeline
                        .agents
                        .iter()
                        .map(|a| a.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            )
        })?;
        self.execute_agent(agent).await.map_err(|e| self.fail(agent, e))
    }

    /// Complete/Pending per agent, from artifact existence only.
    pub async fn status(&self) -> Vec<AgentStatus> {
        let mut statuses = Vec::with_capacity(self.pipeline.agents.len());
        for agent in &self.pipeline.agents {
            statuses.push(AgentStatus {
                id: agent.id.clone(),
                display_name: agent.display_name.clone(),
                artifact: self.store.path_for(&agent.output_artifact),
                complete: self.store.exists(&agent.output_artifact).await,
            });
        }
        statuses
    }

    /// Remove every persisted artifact. Returns `false` if there was nothing to remove.
    pub async fn clean(&self) -> Result<bool, PipelineError> {
        Ok(self.store.clean().await?)
    }

    async fn execute_agent(&self, agent: &AgentSpec) -> Result<StepOutcome, PipelineError> {
        let started = Instant::now();
        tracing::info!("[Orchestrator] Starting '{}' ({})", agent.id, agent.provider);
        println!("   ▶  {} ({})", agent.display_name, agent.provider);

        for input in &agent.input_artifacts {
            if !self.store.exists(input).await {
                return Err(PipelineError::MissingDependency {
                    agent_id: agent.id.clone(),
                    artifact: input.clone(),
                });
            }
        }

        let template = self.prompts.load(&agent.prompt_source).await?;
        let mut inputs = Vec::with_capacity(agent.input_artifacts.len());
        for input in &agent.input_artifacts {
            inputs.push((input.clone(), self.store.read(input).await?));
        }
        let prompt = render_prompt(&template, &inputs);

        let provider = self.registry.get(agent.provider).ok_or_else(|| {
            PipelineError::InvalidPipeline(format!(
                "no adapter registered for provider '{}'",
                agent.provider.as_str()
            ))
        })?;
        let model = self.pipeline.resolve_model(agent, &self.config.generation);
        tracing::debug!(
            "[Orchestrator] '{}' prompt: {} chars, model {}",
            agent.id,
            prompt.len(),
            model
        );

        let request = GenerateRequest::new(&prompt, &model)
            .with_system_prompt(agent.system_prompt.as_deref());
        let text = provider.generate(request).await?;

        let decoded = decode::decode(&text);
        let parse_error = decode::is_parse_failure(&decoded);
        let duration = started.elapsed();
        let document = stamp_metadata(decoded, agent, &model, duration);

        self.store.write(&agent.output_artifact, &document).await?;

        let path = self.store.path_for(&agent.output_artifact);
        tracing::info!(
            "[Orchestrator] Completed '{}' in {}ms → {}",
            agent.id,
            duration.as_millis(),
            path.display()
        );
        if parse_error {
            println!("   ⚠  {} reply was not JSON; raw text kept", agent.id);
        }
        println!("   ✅ {} → {}", agent.id, path.display());

        Ok(StepOutcome {
            agent_id: agent.id.clone(),
            artifact: agent.output_artifact.clone(),
            path,
            model,
            duration,
            parse_error,
        })
    }

    fn fail(&self, agent: &AgentSpec, error: PipelineError) -> StepFailure {
        tracing::error!("[Orchestrator] Agent '{}' failed: {}", agent.id, error);
        println!("   ❌ {} failed [{}]", agent.id, error.kind());
        StepFailure::new(&agent.id, error)
    }
}

/// Merge run metadata into the decoded value's `metadata` object.
///
/// Non-object values are wrapped as `{ "data": <value> }` first; an
/// existing `metadata` object keeps its other keys.
fn stamp_metadata(value: Value, agent: &AgentSpec, model: &str, duration: Duration) -> Value {
    let mut document = match value {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };

    let mut metadata = match document.remove("metadata") {
        Some(Value::Object(existing)) => existing,
        _ => serde_json::Map::new(),
    };
    metadata.insert("agentId".to_string(), Value::from(agent.id.clone()));
    metadata.insert("provider".to_string(), Value::from(agent.provider.as_str()));
    metadata.insert("model".to_string(), Value::from(model));
    metadata.insert("timestamp".to_string(), Value::from(chrono::Utc::now().to_rfc3339()));
    metadata.insert(
        "executionTimeMs".to_string(),
        Value::from(duration.as_millis() as u64),
    );
    metadata.insert("status".to_string(), Value::from("completed"));

    document.insert("metadata".to_string(), Value::Object(metadata));
    Value::Object(document)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
