//! Gemini `generateContent` adapter.
//!
//! POST {base_url}/v1beta/models/{model}:generateContent
//! Headers:
//!   x-goog-api-key: {api_key}
//!   content-type: application/json

use async_trait::async_trait;

use super::{number, AdapterContext, GenerateRequest, ModelProvider, Provider};
use crate::config::OrchestratorConfig;
use crate::error::PipelineError;
use crate::transport::{HttpRequest, ResilientTransport};

pub struct GeminiProvider {
    ctx: AdapterContext,
}

impl GeminiProvider {
    pub(crate) fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    pub fn from_config(config: &OrchestratorConfig, transport: ResilientTransport) -> Self {
        Self::new(AdapterContext::from_config(Provider::Gemini, config, transport))
    }

    fn build_body(&self, request: &GenerateRequest<'_>) -> serde_json::Value {
        let params = &self.ctx.params;
        let mut generation_config = serde_json::json!({
            "temperature": number(params.temperature),
            "maxOutputTokens": params.max_output_tokens,
        });
        if let Some(top_p) = params.top_p {
            generation_config["topP"] = number(top_p);
        }
        if let Some(top_k) = params.top_k {
            generation_config["topK"] = serde_json::Value::from(top_k);
        }

        let mut body = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": request.prompt }]
                }
            ],
            "generationConfig": generation_config,
        });

        if let Some(system) = request.system_prompt.filter(|s| !s.is_empty()) {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        body
    }
}

/// Text parts of the first candidate, joined by newlines.
fn extract_text(json: &serde_json::Value) -> String {
    json.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, PipelineError> {
        let api_key = self.ctx.api_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.ctx.base_url, request.model
        );

        tracing::info!("[Gemini] Calling {} (model: {})", url, request.model);

        let http = HttpRequest::post_json(url, self.build_body(&request))
            .header("x-goog-api-key", api_key);
        let json = self.ctx.call(http).await?;
        self.ctx.non_empty(extract_text(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{context, RecordingSender};

    #[tokio::test]
    async fn test_generate_builds_gemini_request_and_joins_parts() {
        let sender = RecordingSender::responding(
            200,
            serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "first" }, { "text": "second" }] }
                }]
            }),
        );
        let provider =
            GeminiProvider::new(context(Provider::Gemini, sender.clone(), Some("g-key")));

        let text = provider
            .generate(GenerateRequest::new("Research the schedule", "gemini-2.5-pro"))
            .await
            .unwrap();
        assert_eq!(text, "first\nsecond");

        let req = sender.last_request();
        assert_eq!(
            req.url,
            "http://gemini.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(req.header_value("x-goog-api-key"), Some("g-key"));
        let body = req.body.unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Research the schedule");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 32000);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert!(body.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let sender = RecordingSender::responding(200, serde_json::json!({}));
        let provider = GeminiProvider::new(context(Provider::Gemini, sender.clone(), None));

        let err = provider
            .generate(GenerateRequest::new("p", "gemini-2.5-pro"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingCredential { env_var: "GEMINI_API_KEY", .. }
        ));
        assert_eq!(sender.request_count(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let sender = RecordingSender::responding(200, serde_json::json!({ "candidates": [] }));
        let provider = GeminiProvider::new(context(Provider::Gemini, sender, Some("g-key")));

        let err = provider
            .generate(GenerateRequest::new("p", "gemini-2.5-pro"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "EmptyResponse");
    }

    #[tokio::test]
    async fn test_embedded_error_on_200() {
        let sender = RecordingSender::responding(
            200,
            serde_json::json!({ "error": { "code": 400, "message": "API key not valid" } }),
        );
        let provider = GeminiProvider::new(context(Provider::Gemini, sender, Some("g-key")));

        let err = provider
            .generate(GenerateRequest::new("p", "gemini-2.5-pro"))
            .await
            .unwrap_err();
        match err {
            PipelineError::ProviderError { message, .. } => {
                assert_eq!(message, "API key not valid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
