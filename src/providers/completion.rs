/*!
 * Client for self-hosted completion-style endpoints (llama.cpp, text-gen
 * servers and similar).
 *
 * The body carries the repetition penalty under both field names the common
 * servers accept, plus `n_predict` for the output budget. No auth header is
 * sent; these endpoints sit on a local network.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{ChatMessage, HTTP_TIMEOUT, Provider, classify_status, extract_content, map_send_error};
use crate::app_config::Config;
use crate::errors::ProviderError;

/// Client for completion-dialect endpoints.
pub struct CompletionClient {
    client: Client,
    config: Config,
}

/// Request body in the completion dialect.
#[derive(Debug, Serialize)]
pub struct CompletionRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    repeat_penalty: f64,
    repetition_penalty: f64,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    n_predict: Option<u32>,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build the request body for one call.
    pub fn build_body<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionRequestBody<'a> {
        CompletionRequestBody {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            repeat_penalty: self.config.repetition_penalty,
            repetition_penalty: self.config.repetition_penalty,
            stream: false,
            n_predict: (self.config.max_output_tokens > 0).then_some(self.config.max_output_tokens),
        }
    }
}

#[async_trait]
impl Provider for CompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let body = self.build_body(system, user);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read error body: {}", e));
            return Err(classify_status(status.as_u16(), message));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        extract_content(&value)
            .ok_or_else(|| ProviderError::ParseError("response contains no content field".to_string()))
    }
}
