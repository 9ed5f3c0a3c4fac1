//! Chat client abstraction and request/response types.
//!
//! This module defines the core abstractions for interacting with
//! chat-completion providers. The retrieval pipeline only depends on
//! these traits; concrete providers live in [`crate::providers`].

use serde::{Deserialize, Serialize};
use veye_core::AppResult;

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user message to send to the model
    pub prompt: String,

    /// Model identifier (e.g., "deepseek-ai/DeepSeek-V3")
    pub model: String,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Request a JSON object response from the provider
    #[serde(default)]
    pub json_mode: bool,
}

impl ChatRequest {
    /// Create a new chat request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            max_tokens: None,
            temperature: None,
            json_mode: false,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask the provider for a strict JSON object response.
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: ChatUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

/// Trait for chat-completion providers.
///
/// This trait abstracts the underlying provider (HF router, OpenAI,
/// a local runtime, a test double) behind a single request/response
/// exchange. Callers that need fail-soft behavior wrap the returned
/// error themselves; the client reports failures honestly.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the provider name (e.g., "openai-compat", "mock").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming chat completion.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}

/// Strip markdown code fences from a model response.
///
/// Models asked for JSON sometimes wrap the object in ``` fences
/// (optionally tagged "json"). This unwraps a fenced body and leaves
/// unfenced text untouched.
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line
    match body.split_once('\n') {
        Some((first_line, remainder)) if first_line.chars().all(|c| c.is_ascii_alphanumeric()) => {
            remainder.trim()
        }
        _ => body.trim(),
    }
}
