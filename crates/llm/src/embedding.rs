//! Embedding provider trait and fallback chain.
//!
//! Embedding availability varies per hosted model, so callers hold a
//! prioritized [`EmbeddingChain`] instead of a single provider: the
//! chain tries each provider in order and the first success wins.

use std::sync::Arc;
use veye_core::{AppError, AppResult};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai-compat", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// The result vector is index-aligned with `texts`.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Llm("No embedding returned".to_string()))
    }
}

/// Prioritized chain of embedding providers.
///
/// Providers are tried in order; the first one to return a usable
/// result wins. Which model identifier actually served a request is a
/// detail of the chain, invisible to callers.
#[derive(Debug, Clone)]
pub struct EmbeddingChain {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
}

impl EmbeddingChain {
    /// Create a chain from providers in priority order.
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { providers }
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for EmbeddingChain {
    fn provider_name(&self) -> &str {
        "chain"
    }

    fn model_name(&self) -> &str {
        self.providers
            .first()
            .map(|p| p.model_name())
            .unwrap_or("none")
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.embed_batch(texts).await {
                Ok(embeddings) if embeddings.len() == texts.len() => {
                    tracing::debug!(
                        model = provider.model_name(),
                        batch = texts.len(),
                        "Embedding batch served"
                    );
                    return Ok(embeddings);
                }
                Ok(embeddings) => {
                    tracing::warn!(
                        model = provider.model_name(),
                        expected = texts.len(),
                        got = embeddings.len(),
                        "Embedding provider returned misaligned batch, trying next"
                    );
                    last_error = Some(AppError::Llm(format!(
                        "Provider '{}' returned {} embeddings for {} texts",
                        provider.model_name(),
                        embeddings.len(),
                        texts.len()
                    )));
                }
                Err(e) => {
                    tracing::warn!(
                        model = provider.model_name(),
                        error = %e,
                        "Embedding provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Llm("No embedding providers configured".to_string())))
    }
}
