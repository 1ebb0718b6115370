//! `conductor agent <id>`: execute one agent against existing artifacts.

use console::style;

use conductor_core::{Orchestrator, StepOutcome};

use super::{format_duration, Settings};

pub async fn run(settings: &Settings, agent_id: &str) -> Result<(), String> {
    let orchestrator = settings.orchestrator()?;
    execute(&orchestrator, agent_id).await.map(|_| ())
}

pub async fn execute(orchestrator: &Orchestrator, agent_id: &str) -> Result<StepOutcome, String> {
    let outcome = orchestrator
        .run_agent(agent_id)
        .await
        .map_err(|failure| failure.to_string())?;

    println!(
        "{} {} completed in {} → {}",
        style("✓").green(),
        outcome.agent_id,
        format_duration(outcome.duration),
        outcome.path.display()
    );
    Ok(outcome)
}
