//! Stage planning and validation over the declared agents.
//!
//! Agents are walked in declaration order. A sequential agent is its own
//! stage; the first member of a parallel group pulls every agent sharing
//! that group id into a single fan-out stage.

use std::collections::{HashMap, HashSet};

use super::schema::{AgentSpec, PipelineDefinition};
use crate::error::PipelineError;

/// One unit of scheduling.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage<'a> {
    /// Runs alone, to completion, before the next stage starts
    Sequential(&'a AgentSpec),
    /// Members run concurrently and are joined before the next stage
    Parallel {
        group: &'a str,
        agents: Vec<&'a AgentSpec>,
    },
}

impl<'a> Stage<'a> {
    pub fn agents(&self) -> Vec<&'a AgentSpec> {
        match self {
            Stage::Sequential(agent) => vec![*agent],
            Stage::Parallel { agents, .. } => agents.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Stage::Sequential(agent) => agent.id.clone(),
            Stage::Parallel { group, agents } => format!(
                "{} [{}]",
                group,
                agents.iter().map(|a| a.id.as_str()).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

impl PipelineDefinition {
    /// Execution plan in declaration order.
    pub fn stages(&self) -> Vec<Stage<'_>> {
        let mut stages = Vec::new();
        let mut seen_groups: HashSet<&str> = HashSet::new();

        for agent in &self.agents {
            match agent.group() {
                None => stages.push(Stage::Sequential(agent)),
                Some(group) => {
                    if !seen_groups.insert(group) {
                        continue;
                    }
                    let members = self
                        .agents
                        .iter()
                        .filter(|a| a.group() == Some(group))
                        .collect();
                    stages.push(Stage::Parallel {
                        group,
                        agents: members,
                    });
                }
            }
        }

        stages
    }

    /// Check the graph invariants:
    /// - agent ids are unique and non-empty
    /// - output artifacts are unique (so parallel members never share one)
    /// - every input is produced by an agent in a strictly earlier stage,
    ///   which also rules out cycles and same-group dependencies
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.agents.is_empty() {
            return Err(PipelineError::InvalidPipeline(format!(
                "pipeline '{}' declares no agents",
                self.name
            )));
        }

        let mut ids = HashSet::new();
        let mut producers: HashMap<&str, &str> = HashMap::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(PipelineError::InvalidPipeline(
                    "agent id must not be empty".to_string(),
                ));
            }
            if !ids.insert(agent.id.as_str()) {
                return Err(PipelineError::InvalidPipeline(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
            let previous = producers.insert(agent.output_artifact.as_str(), agent.id.as_str());
            if let Some(other) = previous {
                return Err(PipelineError::InvalidPipeline(format!(
                    "agents '{}' and '{}' both write '{}'",
                    other, agent.id, agent.output_artifact
                )));
            }
        }

        let mut stage_of: HashMap<&str, usize> = HashMap::new();
        for (index, stage) in self.stages().iter().enumerate() {
            for agent in stage.agents() {
                stage_of.insert(agent.id.as_str(), index);
            }
        }

        for agent in &self.agents {
            let consumer_stage = stage_of[agent.id.as_str()];
            for input in &agent.input_artifacts {
                let producer = producers.get(input.as_str()).ok_or_else(|| {
                    PipelineError::InvalidPipeline(format!(
                        "agent '{}' reads '{}', which no agent produces",
                        agent.id, input
                    ))
                })?;
                if stage_of[producer] >= consumer_stage {
                    return Err(PipelineError::InvalidPipeline(format!(
                        "agent '{}' reads '{}' from '{}', which is not scheduled before it",
                        agent.id, input, producer
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Provider;

    fn agent(id: &str) -> AgentSpec {
        AgentSpec::new(id, Provider::Gemini, format!("{id}.md"), format!("{id}.json"))
    }

    fn three_step() -> PipelineDefinition {
        PipelineDefinition::new(
            "three-step",
            vec![
                agent("step1"),
                agent("step2").inputs(["step1.json"]),
                agent("step3a").inputs(["step2.json"]).in_group("g"),
                agent("step3b").inputs(["step2.json"]).in_group("g"),
            ],
        )
    }

    #[test]
    fn test_stages_group_parallel_members() {
        let def = three_step();
        let stages = def.stages();
        assert_eq!(stages.len(), 3);
        assert!(matches!(stages[0], Stage::Sequential(a) if a.id == "step1"));
        assert!(matches!(stages[1], Stage::Sequential(a) if a.id == "step2"));
        match &stages[2] {
            Stage::Parallel { group, agents } => {
                assert_eq!(*group, "g");
                let ids: Vec<_> = agents.iter().map(|a| a.id.as_str()).collect();
                assert_eq!(ids, ["step3a", "step3b"]);
            }
            other => panic!("expected parallel stage, got {other:?}"),
        }
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_multiple_groups_keep_declaration_order() {
        let def = PipelineDefinition::new(
            "two-groups",
            vec![
                agent("a"),
                agent("b1").inputs(["a.json"]).in_group("first"),
                agent("b2").inputs(["a.json"]).in_group("first"),
                agent("c").inputs(["b1.json", "b2.json"]),
                agent("d1").inputs(["c.json"]).in_group("second"),
                agent("d2").inputs(["c.json"]).in_group("second"),
                agent("e").inputs(["d1.json", "d2.json"]),
            ],
        );
        let labels: Vec<_> = def.stages().iter().map(Stage::label).collect();
        assert_eq!(labels, ["a", "first [b1, b2]", "c", "second [d1, d2]", "e"]);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_empty_group_id_is_sequential() {
        let def =
            PipelineDefinition::new("x", vec![agent("a").in_group(""), agent("b").in_group("")]);
        assert_eq!(def.stages().len(), 2);
    }

    #[test]
    fn test_parallel_members_write_distinct_outputs() {
        for def in [three_step(), PipelineDefinition::builtin()] {
            for stage in def.stages() {
                let outputs: HashSet<_> =
                    stage.agents().iter().map(|a| a.output_artifact.clone()).collect();
                assert_eq!(outputs.len(), stage.agents().len());
            }
        }
    }

    #[test]
    fn test_shared_output_is_rejected() {
        let mut clash = agent("step3b").in_group("g");
        clash.output_artifact = "step3a.json".to_string();
        let def = PipelineDefinition::new("x", vec![agent("step3a").in_group("g"), clash]);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("both write"));
    }

    #[test]
    fn test_same_group_dependency_is_rejected() {
        let def = PipelineDefinition::new(
            "x",
            vec![
                agent("a").in_group("g"),
                agent("b").inputs(["a.json"]).in_group("g"),
            ],
        );
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let def = PipelineDefinition::new("x", vec![agent("a").inputs(["b.json"]), agent("b")]);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_unknown_input_and_duplicate_id_are_rejected() {
        let def = PipelineDefinition::new("x", vec![agent("a").inputs(["nowhere.json"])]);
        assert!(def.validate().unwrap_err().to_string().contains("no agent produces"));

        let mut dup = agent("a");
        dup.output_artifact = "other.json".to_string();
        let def = PipelineDefinition::new("x", vec![agent("a"), dup]);
        assert!(def.validate().unwrap_err().to_string().contains("duplicate agent id"));
    }

    #[test]
    fn test_builtin_pipeline_is_valid() {
        let def = PipelineDefinition::builtin();
        assert!(def.validate().is_ok());
        assert_eq!(def.stages().len(), 4);
    }
}
