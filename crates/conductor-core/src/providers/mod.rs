//! Provider Adapters: one per generative-model service.
//!
//! Every adapter exposes the same `generate` contract while speaking its
//! own wire format underneath:
//!
//! ```text
//! Orchestrator ──► ProviderRegistry ──► GeminiProvider    (contents + generationConfig)
//!                                   ├─► OpenAiProvider    (chat messages + sampling params)
//!                                   └─► AnthropicProvider (messages API)
//!                                              │
//!                                      ResilientTransport
//! ```

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{GenerationParams, OrchestratorConfig};
use crate::error::PipelineError;
use crate::transport::{HttpRequest, ResilientTransport};

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// The closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn base_url_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_BASE_URL",
            Provider::OpenAi => "OPENAI_BASE_URL",
            Provider::Anthropic => "ANTHROPIC_BASE_URL",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAi => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::OpenAi => write!(f, "OpenAI"),
            Provider::Anthropic => write!(f, "Anthropic"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" | "gpt" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(format!(
                "Unknown provider '{}'. Expected one of: gemini, openai, anthropic",
                other
            )),
        }
    }
}

/// What to ask a provider for.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub system_prompt: Option<&'a str>,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(prompt: &'a str, model: &'a str) -> Self {
        Self {
            prompt,
            model,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<&'a str>) -> Self {
        self.system_prompt = system_prompt;
        self
    }
}

/// Uniform contract over all provider wire formats.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Generate text for `request`. Returns the non-empty generated text.
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, PipelineError>;
}

/// Shared plumbing for the HTTP-backed adapters.
#[derive(Clone)]
pub(crate) struct AdapterContext {
    pub provider: Provider,
    pub transport: ResilientTransport,
    pub api_key: Option<String>,
    pub base_url: String,
    pub params: GenerationParams,
    pub timeout: Duration,
}

impl AdapterContext {
    pub fn from_config(
        provider: Provider,
        config: &OrchestratorConfig,
        transport: ResilientTransport,
    ) -> Self {
        Self {
            provider,
            transport,
            api_key: config.credentials.get(provider).map(str::to_string),
            base_url: config.endpoints.get(provider).trim_end_matches('/').to_string(),
            params: config.generation.get(provider).clone(),
            timeout: config.transport.timeout,
        }
    }

    /// The credential, or `MissingCredential` before any I/O happens.
    pub fn api_key(&self) -> Result<&str, PipelineError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PipelineError::MissingCredential {
                provider: self.provider,
                env_var: self.provider.credential_env_var(),
            })
    }

    /// Send through the resilient transport and classify the outcome.
    ///
    /// Non-2xx responses and 2xx bodies carrying an `error` object become
    /// `ProviderError`; otherwise the parsed JSON body is returned.
    pub async fn call(&self, request: HttpRequest) -> Result<serde_json::Value, PipelineError> {
        let request = request.timeout(self.timeout);
        tracing::debug!(
            "[{}] POST {} ({} body bytes)",
            self.provider,
            request.url_without_query(),
            request.body.as_ref().map(|b| b.to_string().len()).unwrap_or(0)
        );

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| PipelineError::from_transport(self.provider, e))?;

        if !response.is_success() {
            return Err(PipelineError::ProviderError {
                provider: self.provider,
                status: Some(response.status),
                message: response.body,
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| PipelineError::ProviderError {
                provider: self.provider,
                status: Some(response.status),
                message: format!("Failed to parse response JSON: {}", e),
            })?;

        if let Some(message) = embedded_error(&json) {
            return Err(PipelineError::ProviderError {
                provider: self.provider,
                status: Some(response.status),
                message,
            });
        }

        Ok(json)
    }

    /// Reject blank text as `EmptyResponse`.
    pub fn non_empty(&self, text: String) -> Result<String, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyResponse {
                provider: self.provider,
            });
        }
        tracing::info!("[{}] Received {} characters", self.provider, text.len());
        Ok(text)
    }
}

/// Message of an `error` object embedded in an otherwise successful body.
fn embedded_error(json: &serde_json::Value) -> Option<String> {
    let error = json.get("error").filter(|e| !e.is_null())?;
    Some(
        error
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .or_else(|| error.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| error.to_string()),
    )
}

pub(crate) fn number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::from(0))
}

/// Adapters indexed by provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three HTTP adapters, sharing one resilient transport.
    pub fn from_config(config: &OrchestratorConfig, transport: ResilientTransport) -> Self {
        Self::new()
            .with(Arc::new(GeminiProvider::new(AdapterContext::from_config(
                Provider::Gemini,
                config,
                transport.clone(),
            ))))
            .with(Arc::new(OpenAiProvider::new(AdapterContext::from_config(
                Provider::OpenAi,
                config,
                transport.clone(),
            ))))
            .with(Arc::new(AnthropicProvider::new(AdapterContext::from_config(
                Provider::Anthropic,
                config,
                transport,
            ))))
    }

    /// Register (or replace) the adapter for `provider.provider()`.
    pub fn with(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.insert(provider.provider(), provider);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&provider).cloned()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::config::Credentials;
    use crate::error::TransportError;
    use crate::transport::{HttpResponse, HttpSend, RetryPolicy};

    /// Records every request and answers from a script.
    pub struct RecordingSender {
        pub requests: Mutex<Vec<HttpRequest>>,
        script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    }

    impl RecordingSender {
        pub fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                script: Mutex::new(script.into()),
            })
        }

        pub fn responding(status: u16, body: serde_json::Value) -> Arc<Self> {
            Self::new(vec![Ok(HttpResponse::new(status, body.to_string()))])
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl HttpSend for RecordingSender {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    pub fn context(
        provider: Provider,
        sender: Arc<RecordingSender>,
        key: Option<&str>,
    ) -> AdapterContext {
        let mut config = OrchestratorConfig::default();
        if let Some(key) = key {
            config.credentials = Credentials::default().with(provider, key);
        }
        config.endpoints.gemini = "http://gemini.test".to_string();
        config.endpoints.openai = "http://openai.test".to_string();
        config.endpoints.anthropic = "http://anthropic.test".to_string();
        let transport = ResilientTransport::new(sender, RetryPolicy::none());
        AdapterContext::from_config(provider, &config, transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_serde_names() {
        let json = serde_json::to_string(&Provider::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: Provider = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, Provider::Anthropic);
    }

    #[test]
    fn test_embedded_error_message() {
        let body = serde_json::json!({ "error": { "message": "quota exceeded", "code": 429 } });
        assert_eq!(embedded_error(&body).as_deref(), Some("quota exceeded"));

        let body = serde_json::json!({ "error": "overloaded" });
        assert_eq!(embedded_error(&body).as_deref(), Some("overloaded"));

        let body = serde_json::json!({ "error": null, "choices": [] });
        assert_eq!(embedded_error(&body), None);
    }
}
