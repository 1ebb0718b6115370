//! `conductor validate`: check the pipeline graph and print its stages.

use conductor_core::{PipelineDefinition, Stage};

use super::Settings;

pub fn run(settings: &Settings) -> Result<(), String> {
    let pipeline = settings.load_pipeline()?;
    let lines = plan(&pipeline)?;

    println!("📄 Pipeline: {} (v{})", pipeline.name, pipeline.version);
    if let Some(desc) = &pipeline.description {
        println!("   {}", desc);
    }
    println!();
    for line in lines {
        println!("{}", line);
    }
    println!();
    println!("✅ Pipeline is valid");
    Ok(())
}

/// Validate `pipeline` and describe each stage, one line per agent.
pub fn plan(pipeline: &PipelineDefinition) -> Result<Vec<String>, String> {
    pipeline.validate().map_err(|e| e.to_string())?;

    let mut lines = Vec::new();
    for (i, stage) in pipeline.stages().iter().enumerate() {
        match stage {
            Stage::Sequential(_) => lines.push(format!("Stage {}", i + 1)),
            Stage::Parallel { group, .. } => {
                lines.push(format!("Stage {} (parallel: {})", i + 1, group))
            }
        }
        for agent in stage.agents() {
            let inputs = if agent.input_artifacts.is_empty() {
                "-".to_string()
            } else {
                agent.input_artifacts.join(", ")
            };
            lines.push(format!(
                "  {} [{}] {} → {} (inputs: {})",
                agent.id,
                agent.provider.as_str(),
                agent.prompt_source,
                agent.output_artifact,
                inputs
            ));
        }
    }
    Ok(lines)
}
