//! `conductor run`: execute the whole pipeline.

use console::style;

use conductor_core::{Orchestrator, RunReport};

use super::{format_duration, Settings};

pub async fn run(settings: &Settings) -> Result<(), String> {
    let orchestrator = settings.orchestrator()?;
    execute(&orchestrator).await.map(|_| ())
}

/// Run `orchestrator` and print the summary. The failure message names the
/// agent and the error kind.
pub async fn execute(orchestrator: &Orchestrator) -> Result<RunReport, String> {
    match orchestrator.run().await {
        Ok(report) => {
            print_summary(&report);
            Ok(report)
        }
        Err(failure) => {
            println!("═══════════════════════════════════════════════════════════");
            println!("  Pipeline: {}", orchestrator.pipeline().name);
            println!("  Status: {}", style("❌ FAILED").red().bold());
            println!("═══════════════════════════════════════════════════════════");
            Err(failure.to_string())
        }
    }
}

fn print_summary(report: &RunReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Pipeline Complete: {}", report.pipeline);
    println!("  Status: {}", style("✅ SUCCESS").green().bold());
    println!("  Agents: {} completed", report.steps.len());
    for step in &report.steps {
        let marker = if step.parse_error {
            style("⚠").yellow()
        } else {
            style("✓").green()
        };
        println!(
            "    {} {:<16} {:>7}  {}",
            marker,
            step.agent_id,
            format_duration(step.duration),
            style(&step.model).dim()
        );
    }
    println!("  Total time: {}", format_duration(report.duration));
    if let Some(path) = report.final_artifact() {
        println!("  Final output: {}", path.display());
    }
    println!("═══════════════════════════════════════════════════════════");
}
