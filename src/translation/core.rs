/*!
 * Translation service: endpoint client ownership, the HTTP gate and the
 * transient-retry policy, plus the two public document operations
 * (`should_skip` and `translate_html`).
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app_config::{Config, EndpointDialect};
use crate::errors::{ProviderError, TranslationError};
use crate::html_processor::HtmlDocument;
use crate::language_coverage::should_skip_by_language;
use crate::providers::Provider;
use crate::providers::completion::CompletionClient;
use crate::providers::openai_chat::OpenAiChatClient;

/// Transient failures are retried this many times before giving up.
const HTTP_MAX_RETRIES: u32 = 3;
/// Exponential backoff base and cap between transient retries.
const BACKOFF_BASE_MS: u64 = 300;
const BACKOFF_CAP_MS: u64 = 4000;

/// Log previews are truncated to this many characters.
const LOG_PREVIEW_CHARS: usize = 300;

/// Outcome of the pre-translation language check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipDecision {
    /// Whether the document already reads as the target language.
    pub skip: bool,
    /// Fraction of letters in the target script, in `[0, 1]`.
    pub coverage: f64,
}

/// Translates HTML documents through a chat/completion endpoint.
///
/// One service instance covers one translation run; all documents translated
/// through it share the same HTTP gate, so the endpoint never sees more than
/// `http_concurrency` requests in flight regardless of how many documents are
/// being processed.
pub struct TranslationService {
    pub(crate) config: Config,
    provider: Arc<dyn Provider>,
    gate: Arc<Semaphore>,
}

impl TranslationService {
    /// Create a service with the endpoint client matching the configured
    /// dialect.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let provider: Arc<dyn Provider> = match config.dialect {
            EndpointDialect::OpenAI => Arc::new(OpenAiChatClient::new(config)?),
            EndpointDialect::Completion => Arc::new(CompletionClient::new(config)?),
        };
        Ok(Self::with_provider(config, provider))
    }

    /// Create a service over an arbitrary provider. Used by tests to inject
    /// scripted responses.
    pub fn with_provider(config: &Config, provider: Arc<dyn Provider>) -> Self {
        Self {
            gate: Arc::new(Semaphore::new(config.http_concurrency.max(1))),
            config: config.clone(),
            provider,
        }
    }

    /// Decide whether a document is already in the target language and can be
    /// skipped without issuing any requests.
    pub fn should_skip(&self, html: &str) -> SkipDecision {
        let doc = HtmlDocument::parse(html);
        let (skip, coverage) = should_skip_by_language(&doc, &self.config.target_lang);
        SkipDecision { skip, coverage }
    }

    /// Translate one HTML document, returning the reassembled markup.
    ///
    /// Untranslated regions serialize back byte-identically; a document with
    /// no translatable units is returned unchanged without any requests.
    pub async fn translate_html(
        &self,
        html: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        let mut doc = HtmlDocument::parse(html);
        let units = doc.extract_units();
        if units.is_empty() {
            return Ok(doc.serialize());
        }

        let cores: Vec<String> = units.iter().map(|u| u.core.clone()).collect();
        debug!("Translating {} unit(s)", cores.len());

        let outputs = self.translate_with_degrade(&cores, cancel).await?;
        doc.apply_translations(&units, &outputs);
        Ok(doc.serialize())
    }

    /// One gated call to the endpoint with transient-retry and backoff.
    ///
    /// The gate permit covers exactly the request-response cycle; backoff
    /// sleeps happen with the permit released so a struggling request does
    /// not starve the rest of the run. Every wait point races the
    /// cancellation token.
    pub(crate) async fn call_model(
        &self,
        system: &str,
        user: &str,
        tag: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let permit = tokio::select! {
                permit = self.gate.clone().acquire_owned() => permit
                    .map_err(|e| ProviderError::RequestFailed(e.to_string()))?,
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
            };

            debug!("[{}] send: {}", tag, preview(user));
            let outcome = tokio::select! {
                outcome = self.provider.complete(system, user) => outcome,
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
            };
            drop(permit);

            match outcome {
                Ok(content) => {
                    debug!("[{}] recv: {}", tag, preview(&content));
                    return Ok(content);
                }
                Err(error) if error.is_transient() && attempt <= HTTP_MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "[{}] attempt {}/{} failed ({}), retrying in {:?}",
                        tag,
                        attempt,
                        HTTP_MAX_RETRIES + 1,
                        error,
                        delay
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                    }
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

/// Backoff before retry number `attempt`: base doubled per attempt, capped.
fn backoff_delay(attempt: u32) -> Duration {
    let ms = BACKOFF_BASE_MS
        .saturating_mul(1u64 << (attempt - 1).min(16))
        .min(BACKOFF_CAP_MS);
    Duration::from_millis(ms)
}

/// Single-line truncated preview of request/response text for debug logs.
fn preview(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], "\\n");
    if flat.chars().count() <= LOG_PREVIEW_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    }
}
