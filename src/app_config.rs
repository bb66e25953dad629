use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
///
/// The configuration bundle is immutable for the duration of one
/// translation run.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code, or "auto" to let the model detect it
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Target language code (ISO 639-1 or 639-2)
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Request body dialect for the endpoint
    #[serde(default)]
    pub dialect: EndpointDialect,

    /// Chat/completion endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; sent as a bearer token in the OpenAI dialect
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Custom system prompt; supports `${src}` and `${dst}` placeholders.
    /// Empty means the built-in prompts are used.
    #[serde(default = "String::new")]
    pub system_prompt: String,

    /// Sampling temperature (OpenAI range [0, 2])
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling (OpenAI range [0, 1])
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Frequency penalty (OpenAI range [-2, 2])
    #[serde(default)]
    pub frequency_penalty: f64,

    /// Presence penalty (OpenAI range [-2, 2]); OpenAI dialect only
    #[serde(default)]
    pub presence_penalty: f64,

    /// Repetition penalty for self-hosted endpoints (llama.cpp and friends);
    /// not sent in the OpenAI dialect
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,

    /// Maximum output tokens per request; 0 leaves the decision to the server
    #[serde(default)]
    pub max_output_tokens: u32,

    /// Maximum in-flight HTTP requests per translation run
    #[serde(default = "default_http_concurrency")]
    pub http_concurrency: usize,

    /// Maximum documents translated simultaneously
    #[serde(default = "default_chunk_concurrency")]
    pub chunk_concurrency: usize,
}

/// Request body dialect supported by the translation client
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndpointDialect {
    /// OpenAI-chat-style body (system+user messages, presence penalty)
    #[default]
    OpenAI,
    /// Self-hosted completion-style body (repetition penalty fields)
    Completion,
}

impl EndpointDialect {
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Completion => "Completion",
        }
    }
}

impl std::fmt::Display for EndpointDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Completion => write!(f, "completion"),
        }
    }
}

impl std::str::FromStr for EndpointDialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "completion" | "generic" => Ok(Self::Completion),
            _ => Err(anyhow!("Invalid endpoint dialect: {}", s)),
        }
    }
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_target_lang() -> String {
    "zh".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    1.0
}

fn default_repetition_penalty() -> f64 {
    1.0
}

fn default_http_concurrency() -> usize {
    3
}

fn default_chunk_concurrency() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            dialect: EndpointDialect::default(),
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            system_prompt: String::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            repetition_penalty: default_repetition_penalty(),
            max_output_tokens: 0,
            http_concurrency: default_http_concurrency(),
            chunk_concurrency: default_chunk_concurrency(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration, clamping out-of-range sampling parameters
    /// and rejecting settings the client cannot work with.
    pub fn validate(&mut self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(anyhow!("api_url is empty; configure an endpoint URL"));
        }
        Url::parse(&self.api_url)
            .with_context(|| format!("api_url is not a valid URL: {}", self.api_url))?;

        if self.dialect == EndpointDialect::OpenAI && self.api_key.trim().is_empty() {
            log::warn!("OpenAI dialect selected but api_key is empty; requests may be rejected");
        }

        self.http_concurrency = self.http_concurrency.max(1);
        self.chunk_concurrency = self.chunk_concurrency.max(1);

        self.temperature = self.temperature.clamp(0.0, 2.0);
        self.top_p = self.top_p.clamp(0.0, 1.0);
        self.frequency_penalty = self.frequency_penalty.clamp(-2.0, 2.0);
        self.presence_penalty = self.presence_penalty.clamp(-2.0, 2.0);
        self.repetition_penalty = self.repetition_penalty.max(0.0);

        if self.target_lang.trim().is_empty() {
            return Err(anyhow!("target_lang is empty"));
        }

        Ok(())
    }
}
