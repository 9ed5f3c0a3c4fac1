//! Mock chat and embedding providers for testing and development.

use crate::client::{ChatClient, ChatRequest, ChatResponse, ChatUsage};
use crate::embedding::EmbeddingProvider;
use std::collections::VecDeque;
use std::sync::Mutex;
use veye_core::{AppError, AppResult};

/// Scripted chat client.
///
/// Returns queued responses in order; once the queue is empty every
/// call fails. This lets tests exercise both the happy path and the
/// fail-soft branches of the pipeline with the same type.
pub struct MockChatClient {
    responses: Mutex<VecDeque<AppResult<String>>>,
}

impl MockChatClient {
    /// Create a client that answers with the given contents in order.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| Ok(r.to_string()))
                    .collect(),
            ),
        }
    }

    /// Create a client whose every call fails.
    pub fn always_failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a failure before the remaining responses run out.
    pub fn push_failure(&self) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .push_back(Err(AppError::Llm("scripted failure".to_string())));
    }
}

#[async_trait::async_trait]
impl ChatClient for MockChatClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let next = self
            .responses
            .lock()
            .expect("mock lock poisoned")
            .pop_front();

        match next {
            Some(Ok(content)) => Ok(ChatResponse {
                content,
                model: request.model.clone(),
                usage: ChatUsage::default(),
            }),
            Some(Err(e)) => Err(e),
            None => Err(AppError::Llm("mock response queue exhausted".to_string())),
        }
    }
}

/// Mock embedding provider using trigram-based content-aware embeddings.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like a real model, but
/// consistent and content-dependent, which is what ranking tests need:
/// texts sharing vocabulary score closer than unrelated texts.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_mock_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .collect();

        let mut word_freq = std::collections::HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0) += 1;
        }

        for (word, freq) in word_freq.iter() {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Unit-normalize so cosine tests read directly off dot products
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_mock_embedding(text))
            .collect())
    }
}

/// Embedding provider whose every call fails.
#[derive(Debug)]
pub struct FailingEmbeddingProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Llm("embedding service unavailable".to_string()))
    }
}
