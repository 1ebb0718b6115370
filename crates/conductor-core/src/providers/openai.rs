//! OpenAI chat completions adapter.
//!
//! POST {base_url}/v1/chat/completions
//! Headers:
//!   Authorization: Bearer {api_key}
//!   content-type: application/json

use async_trait::async_trait;

use super::{number, AdapterContext, GenerateRequest, ModelProvider, Provider};
use crate::config::OrchestratorConfig;
use crate::error::PipelineError;
use crate::transport::{HttpRequest, ResilientTransport};

pub struct OpenAiProvider {
    ctx: AdapterContext,
}

impl OpenAiProvider {
    pub(crate) fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    pub fn from_config(config: &OrchestratorConfig, transport: ResilientTransport) -> Self {
        Self::new(AdapterContext::from_config(Provider::OpenAi, config, transport))
    }

    fn build_body(&self, request: &GenerateRequest<'_>) -> serde_json::Value {
        let mut messages = vec![];

        if let Some(system) = request.system_prompt.filter(|s| !s.is_empty()) {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system
            }));
        }

        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt
        }));

        let params = &self.ctx.params;
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": number(params.temperature),
            "max_tokens": params.max_output_tokens,
        });

        if let Some(top_p) = params.top_p {
            body["top_p"] = number(top_p);
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, PipelineError> {
        let api_key = self.ctx.api_key()?;
        let url = format!("{}/v1/chat/completions", self.ctx.base_url);

        tracing::info!("[OpenAI] Calling {} (model: {})", url, request.model);

        let http = HttpRequest::post_json(url, self.build_body(&request))
            .header("Authorization", format!("Bearer {}", api_key));
        let json = self.ctx.call(http).await?;

        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string();

        self.ctx.non_empty(content)
    }
}
