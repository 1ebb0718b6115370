//! Process-wide configuration, built once at startup.
//!
//! Nothing below the CLI reads the environment on its own: credentials,
//! endpoints and tuning knobs are collected here and handed to the
//! orchestrator and the provider adapters by reference.

use std::path::PathBuf;
use std::time::Duration;

use crate::providers::Provider;
use crate::transport::{Backoff, RetryPolicy};

/// One optional secret per provider.
#[derive(Clone, Default)]
pub struct Credentials {
    gemini: Option<String>,
    openai: Option<String>,
    anthropic: Option<String>,
}

impl Credentials {
    /// Read `GEMINI_API_KEY`, `OPENAI_API_KEY` and `ANTHROPIC_API_KEY`.
    /// Empty values count as absent.
    pub fn from_env() -> Self {
        let read = |provider: Provider| {
            std::env::var(provider.credential_env_var())
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            gemini: read(Provider::Gemini),
            openai: read(Provider::OpenAi),
            anthropic: read(Provider::Anthropic),
        }
    }

    pub fn with(mut self, provider: Provider, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match provider {
            Provider::Gemini => self.gemini = key,
            Provider::OpenAi => self.openai = key,
            Provider::Anthropic => self.anthropic = key,
        }
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Gemini => self.gemini.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Anthropic => self.anthropic.as_deref(),
        }
    }
}

// Keys never show up in debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini", &self.gemini.as_deref().map(mask_secret))
            .field("openai", &self.openai.as_deref().map(mask_secret))
            .field("anthropic", &self.anthropic.as_deref().map(mask_secret))
            .finish()
    }
}

/// Show the first 8 characters of a secret followed by `...`.
pub fn mask_secret(value: &str) -> String {
    let head: String = value.chars().take(8).collect();
    format!("{}...", head)
}

/// Base URL per provider.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub gemini: String,
    pub openai: String,
    pub anthropic: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: Provider::Gemini.default_base_url().to_string(),
            openai: Provider::OpenAi.default_base_url().to_string(),
            anthropic: Provider::Anthropic.default_base_url().to_string(),
        }
    }
}

impl Endpoints {
    /// Defaults, overridden by `GEMINI_BASE_URL`, `OPENAI_BASE_URL`, `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> Self {
        let read = |provider: Provider| {
            std::env::var(provider.base_url_env_var())
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| provider.default_base_url().to_string())
        };
        Self {
            gemini: read(Provider::Gemini),
            openai: read(Provider::OpenAi),
            anthropic: read(Provider::Anthropic),
        }
    }

    pub fn get(&self, provider: Provider) -> &str {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

/// Sampling parameters sent with every request to one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub default_model: String,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub gemini: GenerationParams,
    pub openai: GenerationParams,
    pub anthropic: GenerationParams,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            gemini: GenerationParams {
                default_model: "gemini-2.5-pro".to_string(),
                temperature: 0.2,
                top_p: Some(0.95),
                top_k: Some(40),
                max_output_tokens: 32000,
            },
            openai: GenerationParams {
                default_model: "gpt-4-turbo".to_string(),
                temperature: 0.2,
                top_p: None,
                top_k: None,
                max_output_tokens: 16000,
            },
            anthropic: GenerationParams {
                default_model: "claude-sonnet-4-20250514".to_string(),
                temperature: 0.2,
                top_p: None,
                top_k: None,
                max_output_tokens: 32000,
            },
        }
    }
}

impl GenerationSettings {
    pub fn get(&self, provider: Provider) -> &GenerationParams {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

/// Timeout and retry knobs for the resilient transport.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Per-call timeout (default: 300s, model replies can be long)
    pub timeout: Duration,
    /// Additional attempts after the first (default: 3)
    pub max_retries: u32,
    /// Delay between attempts (default: 1000ms)
    pub retry_delay: Duration,
    /// Double the delay after every retry instead of keeping it fixed
    pub exponential_backoff: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            exponential_backoff: false,
        }
    }
}

impl TransportSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = if self.exponential_backoff {
            Backoff::Exponential {
                base: self.retry_delay,
                max: self.retry_delay * 16,
            }
        } else {
            Backoff::Fixed(self.retry_delay)
        };
        RetryPolicy::new(self.max_retries, backoff)
    }
}

/// Everything the orchestrator needs to run a pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory holding one JSON document per agent output
    pub artifacts_dir: PathBuf,
    /// Directory holding the plain-text prompt documents
    pub prompts_dir: PathBuf,
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub generation: GenerationSettings,
    pub transport: TransportSettings,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            prompts_dir: PathBuf::from("prompts"),
            credentials: Credentials::default(),
            endpoints: Endpoints::default(),
            generation: GenerationSettings::default(),
            transport: TransportSettings::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Defaults plus credentials and endpoints from the process environment.
    pub fn from_env() -> Self {
        Self {
            credentials: Credentials::from_env(),
            endpoints: Endpoints::from_env(),
            ..Self::default()
        }
    }
}

/// Expand `${NAME}` and `${NAME:-default}` references from the process
/// environment. Unset names without a default are left as written.
pub fn resolve_env_vars(input: &str) -> String {
    expand_vars(input, |name| std::env::var(name).ok())
}

/// `resolve_env_vars` over an arbitrary variable source.
pub fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let Ok(pattern) =
        regex::Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::-(?P<default>[^}]*))?\}")
    else {
        return input.to_string();
    };
    pattern
        .replace_all(input, |caps: &regex::Captures| {
            lookup(&caps["name"])
                .or_else(|| caps.name("default").map(|d| d.as_str().to_string()))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("CONDUCTOR_TEST_MODEL", "gemini-2.5-flash");
        assert_eq!(resolve_env_vars("${CONDUCTOR_TEST_MODEL}"), "gemini-2.5-flash");
        assert_eq!(
            resolve_env_vars("model-${CONDUCTOR_TEST_MODEL}-x"),
            "model-gemini-2.5-flash-x"
        );
        assert_eq!(
            resolve_env_vars("${CONDUCTOR_TEST_UNSET_VAR:-fallback}"),
            "fallback"
        );
        assert_eq!(
            resolve_env_vars("${CONDUCTOR_TEST_UNSET_VAR}"),
            "${CONDUCTOR_TEST_UNSET_VAR}"
        );
        std::env::remove_var("CONDUCTOR_TEST_MODEL");
    }

    #[test]
    fn test_expand_vars_with_custom_lookup() {
        let vars: std::collections::HashMap<&str, &str> =
            [("REGION", "eu"), ("EMPTY", "")].into_iter().collect();
        let lookup = |name: &str| vars.get(name).map(|v| v.to_string());

        assert_eq!(expand_vars("${REGION}-${REGION:-us}", lookup), "eu-eu");
        assert_eq!(expand_vars("${ZONE:-a}/${ZONE:-}", lookup), "a/");
        // Set but empty is still set
        assert_eq!(expand_vars("[${EMPTY:-x}]", lookup), "[]");
        assert_eq!(expand_vars("${ZONE} and $REGION", lookup), "${ZONE} and $REGION");
        assert_eq!(expand_vars("${not a name}", lookup), "${not a name}");
    }

    #[test]
    fn test_credentials_lookup_and_masking() {
        let creds = Credentials::default().with(Provider::Anthropic, "sk-ant-1234567890");
        assert_eq!(creds.get(Provider::Anthropic), Some("sk-ant-1234567890"));
        assert_eq!(creds.get(Provider::Gemini), None);

        let debug = format!("{:?}", creds);
        assert!(debug.contains("sk-ant-1..."));
        assert!(!debug.contains("567890"));
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = TransportSettings::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
    }
}
