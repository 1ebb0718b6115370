use std::sync::Arc;

use async_trait::async_trait;

use super::request::{HttpRequest, HttpResponse, HttpSend};
use super::retry::RetryPolicy;
use crate::error::TransportError;

/// Single-attempt sender backed by `reqwest`.
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for ReqwestSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpSend for ReqwestSender {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                TransportError::Connection(e.to_string())
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        Ok(HttpResponse { status, body })
    }
}

/// Wraps an `HttpSend` with a hard per-call timeout and a `RetryPolicy`.
///
/// After the last permitted attempt the final outcome (a 5xx response or a
/// transport error) is handed back unchanged.
#[derive(Clone)]
pub struct ResilientTransport {
    sender: Arc<dyn HttpSend>,
    policy: RetryPolicy,
}

impl ResilientTransport {
    pub fn new(sender: Arc<dyn HttpSend>, policy: RetryPolicy) -> Self {
        Self { sender, policy }
    }

    /// Production transport over `reqwest`.
    pub fn reqwest(policy: RetryPolicy) -> Self {
        Self::new(Arc::new(ReqwestSender::new()), policy)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut retry = 0u32;
        loop {
            let attempt = tokio::time::timeout(request.timeout, self.sender.send(request)).await;
            let outcome = match attempt {
                Ok(outcome) => outcome,
                Err(_) => Err(TransportError::Timeout(request.timeout)),
            };

            if retry >= self.policy.max_retries || !self.policy.should_retry(&outcome) {
                return outcome;
            }

            retry += 1;
            let delay = self.policy.delay_for(retry);
            match &outcome {
                Ok(response) => tracing::warn!(
                    "[Transport] {} returned {}, retrying in {}ms ({}/{})",
                    request.url_without_query(),
                    response.status,
                    delay.as_millis(),
                    retry,
                    self.policy.max_retries
                ),
                Err(e) => tracing::warn!(
                    "[Transport] {} failed: {}, retrying in {}ms ({}/{})",
                    request.url_without_query(),
                    e,
                    delay.as_millis(),
                    retry,
                    self.policy.max_retries
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }
}
