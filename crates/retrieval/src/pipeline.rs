//! End-to-end question answering.
//!
//! One request is one sequential pass: extraction → routing →
//! retrieval (structured or semantic) → context assembly → generation.
//! Every internal stage has a degraded-but-available fallback; total
//! generation failure is the only user-visible error state, reported
//! as a localized apology.
//!
//! The engine owns no global state: store, chat client, and embedding
//! provider are injected at construction, with lifecycle owned by the
//! process entry point.

use crate::builder;
use crate::context;
use crate::extract::QueryExtractor;
use crate::params::{QueryParameters, TimeRange};
use crate::prompts::{PromptRenderer, ANSWER_SYSTEM_PROMPT};
use crate::router;
use crate::semantic;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use veye_core::{AppError, AppResult};
use veye_llm::{ChatClient, ChatRequest, EmbeddingProvider};
use veye_store::{Event, EventStore};

/// Outcome status of an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Ok,
    Error,
}

/// The end-to-end response for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub status: AnswerStatus,
    pub answer: String,
    pub language: String,
}

/// Localized apology for when answer generation itself fails.
///
/// Haitian Creole is the default when the detected language has no
/// template.
fn apology(language: &str) -> &'static str {
    match language {
        "fr" => "Désolé, je n'arrive pas à répondre pour le moment. Veuillez réessayer dans un instant.",
        "en" => "Sorry, I can't answer right now. Please try again in a moment.",
        "es" => "Lo siento, no puedo responder en este momento. Inténtalo de nuevo en un momento.",
        _ => "Padon, mwen pa ka reponn kounye a. Tanpri eseye ankò nan yon ti moman.",
    }
}

/// The retrieval-augmented answering engine.
pub struct RetrievalEngine {
    store: Arc<dyn EventStore>,
    chat: Arc<dyn ChatClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: QueryExtractor,
    prompts: PromptRenderer,
    generation_model: String,
}

impl RetrievalEngine {
    /// Assemble the engine from its injected collaborators.
    pub fn new(
        store: Arc<dyn EventStore>,
        chat: Arc<dyn ChatClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        extraction_model: impl Into<String>,
        generation_model: impl Into<String>,
    ) -> AppResult<Self> {
        let extractor = QueryExtractor::new(chat.clone(), extraction_model);

        Ok(Self {
            store,
            chat,
            embedder,
            extractor,
            prompts: PromptRenderer::new()?,
            generation_model: generation_model.into(),
        })
    }

    /// Answer a natural-language question end to end.
    ///
    /// This function does not fail: generation trouble is reported in
    /// the returned status with a localized apology.
    pub async fn answer_question(&self, question: &str) -> ChatAnswer {
        let params = self.extractor.extract(question).await;
        let language = params.language.clone();

        if !router::is_in_domain(&params, question) {
            tracing::info!("Question routed out-of-domain, answering from general knowledge");
            return self.answer_general(question, &language).await;
        }

        let events = self.retrieve_for(&params).await;
        let context = context::format_events(&events);

        tracing::info!(
            events = events.len(),
            language = %language,
            "Generating grounded answer"
        );

        let user_prompt = match self.prompts.answer_user(question, &context, &language) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render answer prompt");
                return ChatAnswer {
                    status: AnswerStatus::Error,
                    answer: apology(&language).to_string(),
                    language,
                };
            }
        };

        let request = ChatRequest::new(user_prompt, &self.generation_model)
            .with_system(ANSWER_SYSTEM_PROMPT)
            .with_temperature(0.3);

        match self.chat.complete(&request).await {
            Ok(response) => ChatAnswer {
                status: AnswerStatus::Ok,
                answer: response.content,
                language,
            },
            Err(e) => {
                tracing::error!(error = %e, "Answer generation failed");
                ChatAnswer {
                    status: AnswerStatus::Error,
                    answer: apology(&language).to_string(),
                    language,
                }
            }
        }
    }

    /// Retrieval only: the candidate set for a question, without
    /// generation. For callers that want raw events.
    pub async fn retrieve_events(&self, question: &str) -> Vec<Event> {
        let params = self.extractor.extract(question).await;
        self.retrieve_for(&params).await
    }

    /// Summarize the last 24 hours for one location.
    ///
    /// The supplementary read path behind a "summary by zone" feature:
    /// structured retrieval with a fixed time window, then a dedicated
    /// summary prompt. Generation failure surfaces here as an error.
    pub async fn summarize_location(&self, location: &str, is_general: bool) -> AppResult<String> {
        let mut params = QueryParameters::default_for(location);
        params.location = Some(location.to_string());
        params.location_is_general = is_general;
        params.time_range = TimeRange::Last24h;

        let events = self.retrieve_for(&params).await;
        if events.is_empty() {
            return Ok(format!(
                "No events detected in the last 24 hours for {}. The area appears calm.",
                location.trim()
            ));
        }

        let context = context::format_events(&events);
        let prompt = self.prompts.summary(location.trim(), &context)?;

        let request = ChatRequest::new(prompt, &self.generation_model)
            .with_system(ANSWER_SYSTEM_PROMPT)
            .with_temperature(0.3);

        let response = self
            .chat
            .complete(&request)
            .await
            .map_err(|e| AppError::Retrieval(format!("Summary generation failed: {}", e)))?;

        Ok(response.content)
    }

    /// Route to structured filtering or semantic fallback.
    ///
    /// A store failure is logged and surfaced as an empty result set,
    /// keeping the pipeline available when the store is degraded.
    async fn retrieve_for(&self, params: &QueryParameters) -> Vec<Event> {
        if params.has_location() {
            let query = match builder::build_query(params) {
                Ok(query) => query,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to build structured query");
                    return Vec::new();
                }
            };

            match self.store.query(&query) {
                Ok(events) => {
                    tracing::debug!(events = events.len(), "Structured retrieval complete");
                    events
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Store query failed, reporting no events");
                    Vec::new()
                }
            }
        } else {
            semantic::semantic_search(self.store.as_ref(), self.embedder.as_ref(), params).await
        }
    }

    /// Answer an out-of-domain question from general knowledge.
    async fn answer_general(&self, question: &str, language: &str) -> ChatAnswer {
        let system = format!(
            "You are a helpful assistant. Answer briefly from general \
             knowledge. Respond in the language tagged \"{}\".",
            language
        );

        let request = ChatRequest::new(question, &self.generation_model)
            .with_system(system)
            .with_temperature(0.7);

        match self.chat.complete(&request).await {
            Ok(response) => ChatAnswer {
                status: AnswerStatus::Ok,
                answer: response.content,
                language: language.to_string(),
            },
            Err(e) => {
                tracing::error!(error = %e, "General answer generation failed");
                ChatAnswer {
                    status: AnswerStatus::Error,
                    answer: apology(language).to_string(),
                    language: language.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use veye_llm::providers::{MockChatClient, MockEmbeddingProvider};
    use veye_store::{NewEvent, Severity, SqliteEventStore};

    const DELMAS_EXTRACTION: &str = r#"{"query_type": "location", "location": "Delmas",
        "location_is_general": true, "event_types": [], "severity": null,
        "time_range": "any", "language": "ht"}"#;

    fn seeded_store() -> Arc<SqliteEventStore> {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let now = Utc::now();
        store
            .insert_events(vec![
                NewEvent {
                    event_type: "roadblock".to_string(),
                    severity: Severity::High,
                    location: "Delmas 19".to_string(),
                    timestamp_start: now - Duration::hours(2),
                    timestamp_end: None,
                    summary: "Burning tires block the road".to_string(),
                    recommended_action: Some("Avoid the area".to_string()),
                    sources_count: 3,
                    messages_used: vec![],
                },
                NewEvent {
                    event_type: "gunshots".to_string(),
                    severity: Severity::Critical,
                    location: "Delmas 33".to_string(),
                    timestamp_start: now - Duration::hours(1),
                    timestamp_end: None,
                    summary: "Sustained gunfire reported".to_string(),
                    recommended_action: None,
                    sources_count: 5,
                    messages_used: vec![],
                },
                NewEvent {
                    event_type: "protest".to_string(),
                    severity: Severity::Medium,
                    location: "Delmas-Feuilles".to_string(),
                    timestamp_start: now - Duration::hours(1),
                    timestamp_end: None,
                    summary: "March on the main road".to_string(),
                    recommended_action: None,
                    sources_count: 1,
                    messages_used: vec![],
                },
            ])
            .unwrap();
        Arc::new(store)
    }

    fn engine_with(chat: MockChatClient, store: Arc<SqliteEventStore>) -> RetrievalEngine {
        RetrievalEngine::new(
            store,
            Arc::new(chat),
            Arc::new(MockEmbeddingProvider::new(64)),
            "extract-model",
            "generate-model",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_answer_question_general_location_end_to_end() {
        // First scripted response feeds extraction, second feeds generation
        let chat = MockChatClient::with_responses(vec![
            DELMAS_EXTRACTION,
            "Gen blokis ak bal tire nan Delmas. Rete lakay ou.",
        ]);
        let engine = engine_with(chat, seeded_store());

        let answer = engine.answer_question("Eske li an sekirite nan Delmas?").await;
        assert_eq!(answer.status, AnswerStatus::Ok);
        assert_eq!(answer.language, "ht");
        assert!(!answer.answer.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_events_prefix_rule_excludes_compound_names() {
        let chat = MockChatClient::with_responses(vec![DELMAS_EXTRACTION]);
        let engine = engine_with(chat, seeded_store());

        let events = engine.retrieve_events("Eske li an sekirite nan Delmas?").await;
        let locations: Vec<&str> = events.iter().map(|e| e.location.as_str()).collect();

        assert!(locations.contains(&"Delmas 19"));
        assert!(locations.contains(&"Delmas 33"));
        assert!(!locations.contains(&"Delmas-Feuilles"));
    }

    #[tokio::test]
    async fn test_out_of_domain_question_skips_retrieval() {
        let extraction = r#"{"query_type": "general", "language": "en"}"#;
        let chat = MockChatClient::with_responses(vec![
            extraction,
            "Why did the chicken cross the road?",
        ]);
        let engine = engine_with(chat, seeded_store());

        let answer = engine.answer_question("What's a good joke?").await;
        assert_eq!(answer.status, AnswerStatus::Ok);
        assert_eq!(answer.language, "en");
        assert!(answer.answer.contains("chicken"));
    }

    #[tokio::test]
    async fn test_generation_failure_returns_localized_apology() {
        let extraction = r#"{"query_type": "location", "location": "Delmas",
            "location_is_general": true, "language": "fr"}"#;
        // Extraction succeeds, then the queue is exhausted so generation fails
        let chat = MockChatClient::with_responses(vec![extraction]);
        let engine = engine_with(chat, seeded_store());

        let answer = engine.answer_question("Quelle est la situation à Delmas ?").await;
        assert_eq!(answer.status, AnswerStatus::Error);
        assert_eq!(answer.language, "fr");
        assert!(answer.answer.starts_with("Désolé"));
    }

    #[tokio::test]
    async fn test_extraction_failure_still_answers() {
        // Extraction fails (empty queue pops an error), generation succeeds
        let chat = MockChatClient::with_responses(vec![]);
        chat.push_failure();
        let engine = engine_with(chat, seeded_store());

        // Defaults carry no keyword or structure → out-of-domain, and
        // generation fails too, so we get the Creole apology.
        let answer = engine.answer_question("Bonjou, kijan ou ye?").await;
        assert_eq!(answer.status, AnswerStatus::Error);
        assert_eq!(answer.language, "ht");
        assert!(answer.answer.starts_with("Padon"));
    }

    #[tokio::test]
    async fn test_semantic_fallback_when_no_location() {
        let extraction = r#"{"query_type": "event_type", "event_types": ["gunshots"],
            "time_range": "any", "language": "ht"}"#;
        let chat = MockChatClient::with_responses(vec![extraction]);
        let engine = engine_with(chat, seeded_store());

        let events = engine.retrieve_events("Ki kote yo tire?").await;
        // Pool is type-filtered; only the gunshots event qualifies
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "gunshots");
    }

    #[tokio::test]
    async fn test_summarize_location_empty_is_calm_message() {
        let chat = MockChatClient::with_responses(vec![]);
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let engine = engine_with(chat, store);

        let summary = engine.summarize_location("Kenscoff", false).await.unwrap();
        assert!(summary.contains("Kenscoff"));
        assert!(summary.contains("calm"));
    }

    #[tokio::test]
    async fn test_summarize_location_generates_from_events() {
        let chat = MockChatClient::with_responses(vec![
            "État des lieux : blokis ak tire nan Delmas.",
        ]);
        let engine = engine_with(chat, seeded_store());

        let summary = engine.summarize_location("Delmas", true).await.unwrap();
        assert!(summary.contains("État des lieux"));
    }

    #[test]
    fn test_apology_language_selection() {
        assert!(apology("fr").starts_with("Désolé"));
        assert!(apology("en").starts_with("Sorry"));
        assert!(apology("es").starts_with("Lo siento"));
        assert!(apology("ht").starts_with("Padon"));
        assert!(apology("de").starts_with("Padon"));
    }
}
