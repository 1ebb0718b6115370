//! `conductor check-env`: report the credentials the pipeline needs.

use console::style;

use conductor_core::config::{mask_secret, Credentials};
use conductor_core::{PipelineDefinition, Provider};

use super::Settings;

/// One credential the pipeline depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialCheck {
    pub provider: Provider,
    pub env_var: &'static str,
    /// Masked value, `None` when unset
    pub masked: Option<String>,
}

pub fn run(settings: &Settings) -> Result<(), String> {
    let pipeline = settings.load_pipeline()?;
    let checks = check(&pipeline, &settings.config().credentials);

    println!("\n🔐 Environment for '{}'\n", pipeline.name);
    for c in &checks {
        match &c.masked {
            Some(masked) => println!("  {} {}: {}", style("✓").green(), c.env_var, masked),
            None => println!("  {} {}: {}", style("✗").red(), c.env_var, style("NOT SET").red()),
        }
    }
    println!();

    let missing: Vec<_> = checks
        .iter()
        .filter(|c| c.masked.is_none())
        .map(|c| c.env_var)
        .collect();
    if missing.is_empty() {
        println!("{}", style("All required credentials are set").green());
        Ok(())
    } else {
        Err(format!(
            "missing credentials: {} (set them in the environment, .env.local or .env)",
            missing.join(", ")
        ))
    }
}

/// Credential state for every provider used by `pipeline`.
pub fn check(pipeline: &PipelineDefinition, credentials: &Credentials) -> Vec<CredentialCheck> {
    pipeline
        .providers()
        .into_iter()
        .map(|provider| CredentialCheck {
            provider,
            env_var: provider.credential_env_var(),
            masked: credentials.get(provider).map(mask_secret),
        })
        .collect()
}
