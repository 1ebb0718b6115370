//! YAML schema types for pipeline definitions.
//!
//! A pipeline YAML declares the agents in execution order:
//!
//! ```yaml
//! name: "Site Build"
//! model_aliases:
//!   claude-sonnet-4-5: "claude-sonnet-4-20250514"
//!
//! agents:
//!   - id: "research"
//!     name: "Gemini (Research)"
//!     provider: gemini
//!     prompt: "1_research.md"
//!     output: "1_research.json"
//!
//!   - id: "frontend"
//!     name: "Claude (Frontend)"
//!     provider: anthropic
//!     model: "${FRONTEND_MODEL:-claude-sonnet-4-5}"
//!     prompt: "3a_frontend.md"
//!     inputs: ["1_research.json"]
//!     output: "3a_frontend.json"
//!     parallel_group: "build"
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{resolve_env_vars, GenerationSettings};
use crate::error::PipelineError;
use crate::providers::Provider;

/// Top-level pipeline definition loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Model name aliases, resolved before every call (alias → concrete model)
    #[serde(default)]
    pub model_aliases: HashMap<String, String>,

    /// Agents in declaration order
    pub agents: Vec<AgentSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Static description of one pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent id
    pub id: String,

    /// Human label
    #[serde(rename = "name", alias = "display_name")]
    pub display_name: String,

    /// Which provider adapter serves this agent
    pub provider: Provider,

    /// Model override (falls back to the provider's default model)
    #[serde(default)]
    pub model: Option<String>,

    /// Prompt document, relative to the prompts directory
    #[serde(rename = "prompt", alias = "prompt_source")]
    pub prompt_source: String,

    /// Artifacts this agent reads, relative to the artifacts directory
    #[serde(default, rename = "inputs", alias = "input_artifacts")]
    pub input_artifacts: Vec<String>,

    /// The single artifact this agent produces
    #[serde(rename = "output", alias = "output_artifact")]
    pub output_artifact: String,

    /// Agents sharing a non-empty group run concurrently
    #[serde(default)]
    pub parallel_group: Option<String>,

    /// Optional system prompt sent through the provider's system slot
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl AgentSpec {
    pub fn new(
        id: impl Into<String>,
        provider: Provider,
        prompt_source: impl Into<String>,
        output_artifact: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            provider,
            model: None,
            prompt_source: prompt_source.into(),
            input_artifacts: Vec::new(),
            output_artifact: output_artifact.into(),
            parallel_group: None,
            system_prompt: None,
        }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_artifacts = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// The parallel group id, ignoring empty strings.
    pub fn group(&self) -> Option<&str> {
        self.parallel_group.as_deref().filter(|g| !g.is_empty())
    }
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>, agents: Vec<AgentSpec>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: default_version(),
            model_aliases: HashMap::new(),
            agents,
        }
    }

    /// Parse a pipeline definition from a YAML string.
    ///
    /// `${ENV_VAR}` references in model names and alias targets are
    /// resolved here, once.
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        let mut definition: Self = serde_yaml::from_str(yaml).map_err(|e| {
            PipelineError::InvalidPipeline(format!("Failed to parse pipeline YAML: {}", e))
        })?;

        for agent in &mut definition.agents {
            if let Some(model) = agent.model.take() {
                agent.model = Some(resolve_env_vars(&model));
            }
        }
        for target in definition.model_aliases.values_mut() {
            *target = resolve_env_vars(target);
        }

        Ok(definition)
    }

    /// Load a pipeline definition from a file path.
    pub fn from_file(path: &str) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidPipeline(format!(
                "Failed to read pipeline file '{}': {}",
                path, e
            ))
        })?;
        Self::from_yaml(&content)
    }

    pub fn agent(&self, id: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Concrete model for `agent`: its override or the provider default,
    /// passed through the alias table.
    pub fn resolve_model(&self, agent: &AgentSpec, generation: &GenerationSettings) -> String {
        let requested = agent
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(generation.get(agent.provider).default_model.as_str());
        self.model_aliases
            .get(requested)
            .cloned()
            .unwrap_or_else(|| requested.to_string())
    }

    /// Providers used by at least one agent, in `Provider::ALL` order.
    pub fn providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.agents.iter().any(|a| a.provider == *p))
            .collect()
    }

    /// The built-in five-agent site pipeline:
    /// research → architecture → {frontend, backend} → integration.
    pub fn builtin() -> Self {
        let mut definition = Self::new(
            "Site Build",
            vec![
                AgentSpec::new("research", Provider::Gemini, "1_research.md", "1_research.json")
                    .named("Gemini (Research)"),
                AgentSpec::new(
                    "architecture",
                    Provider::OpenAi,
                    "2_architecture.md",
                    "2_architecture.json",
                )
                .named("OpenAI (Architecture)")
                .inputs(["1_research.json"])
                .system_prompt(
                    "You are an expert system architect specializing in TypeScript, React, \
                     Next.js, and modern web development.",
                ),
                AgentSpec::new(
                    "frontend",
                    Provider::Anthropic,
                    "3a_frontend.md",
                    "3a_frontend.json",
                )
                .named("Claude #1 (Frontend)")
                .inputs(["1_research.json", "2_architecture.json"])
                .in_group("implementation"),
                AgentSpec::new("backend", Provider::Anthropic, "3b_backend.md", "3b_backend.json")
                    .named("Claude #2 (Backend)")
                    .inputs(["1_research.json", "2_architecture.json"])
                    .in_group("implementation"),
                AgentSpec::new(
                    "integration",
                    Provider::Gemini,
                    "4_integration.md",
                    "4_integration.json",
                )
                .named("Gemini (Final Integration)")
                .inputs(["3a_frontend.json", "3b_backend.json"]),
            ],
        );
        definition.description = Some(
            "Research, architecture, parallel implementation and final integration".to_string(),
        );
        definition
            .model_aliases
            .insert("claude-sonnet-4-5".to_string(), "claude-sonnet-4-20250514".to_string());
        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_pipeline() {
        let yaml = r#"
name: "Test Flow"
agents:
  - id: "step1"
    name: "Step 1"
    provider: gemini
    prompt: "step1.md"
    output: "step1.json"
"#;
        let def = PipelineDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.name, "Test Flow");
        assert_eq!(def.version, "1.0");
        assert_eq!(def.agents.len(), 1);
        assert_eq!(def.agents[0].provider, Provider::Gemini);
        assert!(def.agents[0].input_artifacts.is_empty());
        assert_eq!(def.agents[0].group(), None);
    }

    #[test]
    fn test_parse_full_pipeline() {
        std::env::set_var("CONDUCTOR_SCHEMA_TEST_MODEL", "gpt-4o");
        let yaml = r#"
name: "Site Build"
description: "Five agents"
version: "2.0"
model_aliases:
  fast: "gemini-2.5-flash"
agents:
  - id: "research"
    name: "Research"
    provider: gemini
    model: fast
    prompt: "1_research.md"
    output: "1_research.json"
  - id: "architecture"
    name: "Architecture"
    provider: openai
    model: "${CONDUCTOR_SCHEMA_TEST_MODEL}"
    system_prompt: "You are an architect."
    prompt: "2_architecture.md"
    inputs: ["1_research.json"]
    output: "2_architecture.json"
  - id: "frontend"
    name: "Frontend"
    provider: anthropic
    prompt: "3a_frontend.md"
    inputs: ["2_architecture.json"]
    output: "3a_frontend.json"
    parallel_group: "build"
"#;
        let def = PipelineDefinition::from_yaml(yaml).unwrap();
        std::env::remove_var("CONDUCTOR_SCHEMA_TEST_MODEL");

        assert_eq!(def.version, "2.0");
        assert_eq!(def.agents[1].model.as_deref(), Some("gpt-4o"));
        assert_eq!(def.agents[1].system_prompt.as_deref(), Some("You are an architect."));
        assert_eq!(def.agents[2].group(), Some("build"));

        let generation = GenerationSettings::default();
        assert_eq!(def.resolve_model(&def.agents[0], &generation), "gemini-2.5-flash");
        assert_eq!(def.resolve_model(&def.agents[1], &generation), "gpt-4o");
        assert_eq!(
            def.resolve_model(&def.agents[2], &generation),
            generation.anthropic.default_model
        );
        assert_eq!(
            def.providers(),
            vec![Provider::Gemini, Provider::OpenAi, Provider::Anthropic]
        );
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let yaml = r#"
name: "Bad"
agents:
  - id: "x"
    name: "X"
    provider: mistral
    prompt: "x.md"
    output: "x.json"
"#;
        let err = PipelineDefinition::from_yaml(yaml).unwrap_err();
        assert_eq!(err.kind(), "InvalidPipeline");
    }

    #[test]
    fn test_builtin_pipeline_shape() {
        let def = PipelineDefinition::builtin();
        let ids: Vec<_> = def.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["research", "architecture", "frontend", "backend", "integration"]);
        assert_eq!(def.agent("frontend").unwrap().group(), Some("implementation"));
        assert_eq!(def.agent("backend").unwrap().group(), Some("implementation"));
        assert!(def.agent("architecture").unwrap().system_prompt.is_some());
    }
}
