/*!
 * Error types for the gdtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when sending the API request fails for a non-network reason
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error establishing or maintaining a connection (includes DNS failures)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The per-call hard timeout expired
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The endpoint answered with HTTP 429
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Whether a retry with backoff is worthwhile.
    ///
    /// Transient: connection/DNS failures, request timeouts, HTTP 429 and 5xx.
    /// Everything else (malformed responses, other 4xx) propagates immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::Timeout(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::RequestFailed(_) | Self::ParseError(_) => false,
        }
    }
}

/// Errors that can occur during document translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The caller's cancellation signal fired; not a failure
    #[error("Translation cancelled")]
    Cancelled,
}

impl TranslationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error in the configuration bundle
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
