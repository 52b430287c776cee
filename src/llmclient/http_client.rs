// src/llmclient/http_client.rs
// A single HTTP attempt against the external LLM inference endpoint (§6)

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{LlmCallError, LlmClient, LlmRequest};

pub struct HttpLlmClient {
    http: reqwest::Client,
    endpoint_url: String,
}

impl HttpLlmClient {
    pub fn new(endpoint_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmCallError> {
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.num_predict,
            },
        };

        let response = self
            .http
            .post(&self.endpoint_url)
            .timeout(Duration::from_secs(request.timeout_seconds))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LlmCallError::RateLimited { retry_after });
        }

        if !response.status().is_success() {
            return Err(LlmCallError::Transient(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmCallError::Transient(format!("invalid response body: {e}")))?;

        Ok(parsed.response)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LlmCallError {
    if err.is_timeout() {
        LlmCallError::Timeout
    } else {
        LlmCallError::Transient(err.to_string())
    }
}
