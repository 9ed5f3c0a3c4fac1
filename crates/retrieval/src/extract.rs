//! Query-parameter extraction via the language-understanding call.
//!
//! A single request/response exchange with the extraction model turns
//! free text into a [`QueryParameters`] value. This stage never
//! surfaces an error: on any failure (transport, malformed JSON,
//! exhausted provider) it returns the documented defaults with the
//! original question preserved, so downstream stages always have a
//! well-formed input.

use crate::params::QueryParameters;
use crate::prompts::EXTRACTION_SYSTEM_PROMPT;
use serde_json::Value;
use std::sync::Arc;
use veye_llm::{strip_markdown_fences, ChatClient, ChatRequest};

/// Extracts structured query parameters from natural-language questions.
pub struct QueryExtractor {
    chat: Arc<dyn ChatClient>,
    model: String,
}

impl QueryExtractor {
    /// Create an extractor bound to a chat client and model id.
    pub fn new(chat: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            chat,
            model: model.into(),
        }
    }

    /// Extract parameters from a question. Infallible by contract.
    pub async fn extract(&self, question: &str) -> QueryParameters {
        let request = ChatRequest::new(format!("User question: {}", question), &self.model)
            .with_system(EXTRACTION_SYSTEM_PROMPT)
            .with_temperature(0.0)
            .with_json_mode();

        let response = match self.chat.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Extraction call failed, using default parameters");
                return QueryParameters::default_for(question);
            }
        };

        let body = strip_markdown_fences(&response.content);
        match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                let params = QueryParameters::from_model_response(&value, question);
                tracing::debug!(?params.query_type, location = ?params.location, "Extracted query parameters");
                params
            }
            Err(e) => {
                tracing::warn!(error = %e, "Extraction response was not JSON, using default parameters");
                QueryParameters::default_for(question)
            }
        }
    }
}
