//! Anthropic Messages API adapter.
//!
//! POST {base_url}/v1/messages
//! Headers:
//!   x-api-key: {api_key}
//!   anthropic-version: 2023-06-01
//!   content-type: application/json

use async_trait::async_trait;

use super::{number, AdapterContext, GenerateRequest, ModelProvider, Provider};
use crate::config::OrchestratorConfig;
use crate::error::PipelineError;
use crate::transport::{HttpRequest, ResilientTransport};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    ctx: AdapterContext,
}

impl AnthropicProvider {
    pub(crate) fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    pub fn from_config(config: &OrchestratorConfig, transport: ResilientTransport) -> Self {
        Self::new(AdapterContext::from_config(Provider::Anthropic, config, transport))
    }

    fn build_body(&self, request: &GenerateRequest<'_>) -> serde_json::Value {
        let params = &self.ctx.params;
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": params.max_output_tokens,
            "temperature": number(params.temperature),
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ]
        });

        if let Some(system) = request.system_prompt.filter(|s| !s.is_empty()) {
            body["system"] = serde_json::Value::String(system.to_string());
        }

        if let Some(top_p) = params.top_p {
            body["top_p"] = number(top_p);
        }

        body
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, PipelineError> {
        let api_key = self.ctx.api_key()?;
        let url = format!("{}/v1/messages", self.ctx.base_url);

        tracing::info!("[Anthropic] Calling {} (model: {})", url, request.model);

        let http = HttpRequest::post_json(url, self.build_body(&request))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let json = self.ctx.call(http).await?;

        // Only `text` blocks carry generated output
        let content = json
            .get("content")
            .and_then(|c| c.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|block| {
                        block.get("type").and_then(|t| t.as_str()).unwrap_or("text") == "text"
                    })
                    .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        self.ctx.non_empty(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::providers::test_support::{context, RecordingSender};

    #[tokio::test]
    async fn test_generate_joins_text_blocks_only() {
        let sender = RecordingSender::responding(
            200,
            serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "content": [
                    { "type": "text", "text": "Here is the plan:" },
                    { "type": "tool_use", "id": "t1", "name": "noop", "input": {} },
                    { "type": "text", "text": "```json\n{\"ok\": true}\n```" }
                ]
            }),
        );
        let provider =
            AnthropicProvider::new(context(Provider::Anthropic, sender.clone(), Some("sk-ant")));

        let text = provider
            .generate(GenerateRequest::new("Build the frontend", "claude-sonnet-4-20250514"))
            .await
            .unwrap();
        assert_eq!(text, "Here is the plan:\n```json\n{\"ok\": true}\n```");

        let req = sender.last_request();
        assert_eq!(req.url, "http://anthropic.test/v1/messages");
        assert_eq!(req.header_value("x-api-key"), Some("sk-ant"));
        assert_eq!(req.header_value("anthropic-version"), Some("2023-06-01"));
        let body = req.body.unwrap();
        assert_eq!(body["messages"][0]["content"], "Build the frontend");
        assert_eq!(body["max_tokens"], 32000);
        assert!(body.get("system").is_none());
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_timeout_kind() {
        let sender = RecordingSender::new(vec![Err(TransportError::Timeout(
            std::time::Duration::from_secs(300),
        ))]);
        let provider = AnthropicProvider::new(context(Provider::Anthropic, sender, Some("sk-ant")));

        let err = provider
            .generate(GenerateRequest::new("p", "claude-sonnet-4-20250514"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "Timeout");
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_provider_error() {
        let sender = RecordingSender::new(vec![Ok(crate::transport::HttpResponse::new(
            200,
            "<html>gateway</html>",
        ))]);
        let provider = AnthropicProvider::new(context(Provider::Anthropic, sender, Some("sk-ant")));

        let err = provider
            .generate(GenerateRequest::new("p", "claude-sonnet-4-20250514"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ProviderError");
    }
}
