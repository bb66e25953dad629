/*!
 * Client for OpenAI-chat-style endpoints.
 *
 * Sends a two-message chat completion request (system + user) with the
 * configured sampling parameters and a bearer token when an API key is set.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{ChatMessage, HTTP_TIMEOUT, Provider, classify_status, extract_content, map_send_error};
use crate::app_config::Config;
use crate::errors::ProviderError;

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAiChatClient {
    client: Client,
    config: Config,
}

/// Request body in the chat completion dialect.
#[derive(Debug, Serialize)]
pub struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl OpenAiChatClient {
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
    pub fn build_body<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequestBody<'a> {
        ChatRequestBody {
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
            presence_penalty: self.config.presence_penalty,
            stream: false,
            // 0 delegates the output budget to the server.
            max_tokens: (self.config.max_output_tokens > 0).then_some(self.config.max_output_tokens),
        }
    }
}

#[async_trait]
impl Provider for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let body = self.build_body(system, user);
        let mut request = self.client.post(&self.config.api_url).json(&body);
        let key = self.config.api_key.trim();
        if !key.is_empty() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;
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
