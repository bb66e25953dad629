/*!
 * Endpoint clients for the two supported request dialects.
 *
 * This module contains one client per payload dialect:
 * - OpenAI-chat-style bodies (`openai_chat`)
 * - self-hosted completion-style bodies (`completion`)
 *
 * Each client performs exactly one request-response cycle; retry and
 * concurrency control live in the translation service.
 */

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;

/// Hard per-call timeout, independent of caller-level cancellation.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Common trait for endpoint clients.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Perform one request-response cycle and return the extracted content.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

/// One chat message in a request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Pull the generated text out of a response, accepting the three shapes
/// endpoints answer with, in preference order.
pub fn extract_content(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/choices/0/text").and_then(Value::as_str))
        .or_else(|| value.get("content").and_then(Value::as_str))
        .map(str::to_string)
}

/// Map a reqwest transport error onto the provider taxonomy.
pub(crate) fn map_send_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status onto the provider taxonomy.
pub(crate) fn classify_status(status_code: u16, message: String) -> ProviderError {
    if status_code == 429 {
        ProviderError::RateLimitExceeded(message)
    } else {
        ProviderError::ApiError {
            status_code,
            message,
        }
    }
}

pub mod completion;
pub mod openai_chat;
