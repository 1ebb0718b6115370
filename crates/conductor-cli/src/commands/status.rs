//! `conductor status`: which agents have produced their artifact.

use console::style;

use conductor_core::AgentStatus;

use super::Settings;

pub async fn run(settings: &Settings) -> Result<(), String> {
    let orchestrator = settings.offline_orchestrator()?;
    let statuses = orchestrator.status().await;

    println!("\n📊 Pipeline Status: {}\n", orchestrator.pipeline().name);
    for line in render(&statuses) {
        println!("{}", line);
    }

    let done = statuses.iter().filter(|s| s.complete).count();
    println!("\n{}/{} complete", done, statuses.len());
    Ok(())
}

/// One line per agent: `<id>: ✓ Complete (<path>)` or `<id>: ✗ Pending (<path>)`.
pub fn render(statuses: &[AgentStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|s| {
            let state = if s.complete {
                style("✓ Complete").green().to_string()
            } else {
                style("✗ Pending").red().to_string()
            };
            format!("{}: {} ({})", s.id, state, s.artifact.display())
        })
        .collect()
}
