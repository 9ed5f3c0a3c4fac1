//! Semantic fallback retrieval.
//!
//! Used when a question carries no location, so the structured
//! location filter cannot narrow the search. The candidate pool is
//! still bounded by cheap structured filters before any embedding
//! call; an unbounded pool must never reach the embedding stage. The
//! pool is then ranked by cosine similarity between the enriched query
//! and each event's searchable text.
//!
//! Failure policy: embedding trouble degrades the ranking, never the
//! search. A dead embedding service returns the most recent
//! candidates; an event that failed to embed scores 0.0 instead of
//! being dropped.

use crate::builder;
use crate::params::{QueryParameters, TimeRange};
use veye_core::AppResult;
use veye_llm::EmbeddingProvider;
use veye_store::{Event, EventStore, Severity};

/// Maximum number of events returned by semantic search.
pub const SEMANTIC_TOP_K: usize = 15;

/// Cosine similarity between two vectors.
///
/// Defined as 0.0 when either vector has zero norm (degenerate
/// embedding) — a division by zero must never propagate. Mismatched
/// lengths score over the shared prefix, which only occurs with a
/// misbehaving provider and degrades instead of panicking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Build the text an event is embedded from.
///
/// Priority order: summary first (most discriminative signal), then
/// event type, location, severity when high or critical, and the
/// recommended action.
pub fn searchable_text(event: &Event) -> String {
    let mut parts = vec![
        event.summary.clone(),
        event.event_type.clone(),
        event.location.clone(),
    ];

    if matches!(event.severity, Severity::High | Severity::Critical) {
        parts.push(format!("{} severity", event.severity));
    }

    if let Some(action) = &event.recommended_action {
        parts.push(action.clone());
    }

    parts.join(". ")
}

/// Build the enriched query string for embedding.
///
/// The original question is concatenated with the extracted event
/// types and, when present, a severity token — biasing the embedding
/// toward the user's implicit filters even though they were not
/// applied as hard filters.
pub fn enrich_query(params: &QueryParameters) -> String {
    let mut enriched = params.original_question.clone();

    for event_type in &params.event_types {
        enriched.push(' ');
        enriched.push_str(event_type);
    }

    if let Some(severity) = params.severity {
        enriched.push_str(&format!(" {} severity urgent", severity));
    }

    enriched
}

/// Derive the bounded candidate pool for semantic ranking.
///
/// Location is forced off and an unbounded time range is narrowed to
/// the last 24 hours before the query runs.
fn candidate_pool(
    store: &dyn EventStore,
    params: &QueryParameters,
) -> AppResult<Vec<Event>> {
    let mut pool_params = params.clone();
    pool_params.location = None;
    if pool_params.time_range == TimeRange::Any {
        pool_params.time_range = TimeRange::Last24h;
    }

    let query = builder::build_query(&pool_params)?;
    store.query(&query)
}

/// Rank the candidate pool against the enriched query and return the
/// top candidates.
///
/// Never fails: store errors yield an empty result, embedding errors
/// yield the recency-ordered pool head.
pub async fn semantic_search(
    store: &dyn EventStore,
    embedder: &dyn EmbeddingProvider,
    params: &QueryParameters,
) -> Vec<Event> {
    let pool = match candidate_pool(store, params) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Candidate pool query failed, returning no events");
            return Vec::new();
        }
    };

    if pool.is_empty() {
        tracing::debug!("Semantic candidate pool is empty, skipping embeddings");
        return pool;
    }

    let enriched = enrich_query(params);

    let query_embedding = match embedder.embed(&enriched).await {
        Ok(embedding) => embedding,
        Err(e) => {
            tracing::warn!(error = %e, "Query embedding failed, falling back to recency order");
            return truncate(pool);
        }
    };

    let texts: Vec<String> = pool.iter().map(searchable_text).collect();
    let event_embeddings = match embedder.embed_batch(&texts).await {
        Ok(embeddings) => embeddings,
        Err(e) => {
            tracing::warn!(error = %e, "Candidate embedding failed, falling back to recency order");
            return truncate(pool);
        }
    };

    // Results correlate back to events by stable index; an event whose
    // embedding came back empty scores 0.0 rather than being dropped.
    let mut scored: Vec<(Event, f32)> = pool
        .into_iter()
        .enumerate()
        .map(|(i, event)| {
            let score = event_embeddings
                .get(i)
                .map(|embedding| cosine_similarity(&query_embedding, embedding))
                .unwrap_or(0.0);
            (event, score)
        })
        .collect();

    // Stable sort: ties keep pool order, so recency is the secondary signal
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!(
        candidates = scored.len(),
        top_score = scored.first().map(|(_, s)| *s).unwrap_or(0.0),
        "Semantic ranking complete"
    );

    truncate(scored.into_iter().map(|(event, _)| event).collect())
}

fn truncate(mut events: Vec<Event>) -> Vec<Event> {
    events.truncate(SEMANTIC_TOP_K);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use veye_llm::providers::{FailingEmbeddingProvider, MockEmbeddingProvider};
    use veye_store::{NewEvent, SqliteEventStore};

    fn event(summary: &str, event_type: &str, minutes_ago: i64) -> NewEvent {
        NewEvent {
            event_type: event_type.to_string(),
            severity: Severity::Medium,
            location: "Port-au-Prince".to_string(),
            timestamp_start: Utc::now() - Duration::minutes(minutes_ago),
            timestamp_end: None,
            summary: summary.to_string(),
            recommended_action: None,
            sources_count: 1,
            messages_used: vec![],
        }
    }

    fn params_without_location(question: &str) -> QueryParameters {
        QueryParameters::default_for(question)
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);

        let c = vec![3.0, -1.0, 2.0];
        let sim = cosine_similarity(&a, &c);
        assert!((-1.0..=1.0).contains(&sim));
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a = vec![0.5, 1.5, -2.0];
        let b = vec![1.0, 0.0, 4.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_similarity_zero_vector_is_zero() {
        let a = vec![1.0, 2.0];
        let zero = vec![0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_searchable_text_priority_order() {
        let mut e = Event {
            id: "1".to_string(),
            event_type: "gunshots".to_string(),
            severity: Severity::Critical,
            location: "Martissant".to_string(),
            timestamp_start: Utc::now(),
            timestamp_end: None,
            summary: "Heavy gunfire reported".to_string(),
            recommended_action: Some("Stay indoors".to_string()),
            sources_count: 3,
            messages_used: vec![],
        };

        let text = searchable_text(&e);
        assert!(text.starts_with("Heavy gunfire reported"));
        assert!(text.contains("gunshots"));
        assert!(text.contains("Martissant"));
        assert!(text.contains("critical severity"));
        assert!(text.contains("Stay indoors"));

        // Low severity is left out of the embedding text
        e.severity = Severity::Low;
        assert!(!searchable_text(&e).contains("severity"));
    }

    #[test]
    fn test_enrich_query_appends_filters() {
        let mut params = params_without_location("Is anything happening?");
        params.event_types = vec!["roadblock".to_string(), "protest".to_string()];
        params.severity = Some(Severity::High);

        let enriched = enrich_query(&params);
        assert!(enriched.starts_with("Is anything happening?"));
        assert!(enriched.contains("roadblock"));
        assert!(enriched.contains("protest"));
        assert!(enriched.contains("high severity urgent"));
    }

    #[tokio::test]
    async fn test_empty_pool_returns_empty_without_embedding() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        // FailingEmbeddingProvider would poison the result if called
        let embedder = FailingEmbeddingProvider;

        let params = params_without_location("anything new?");
        let results = semantic_search(&store, &embedder, &params).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_any_time_range_is_narrowed_to_last_24h() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .insert_events(vec![
                event("old roadblock", "roadblock", 60 * 48),
                event("fresh roadblock", "roadblock", 30),
            ])
            .unwrap();

        let embedder = MockEmbeddingProvider::new(64);
        let params = params_without_location("roadblock anywhere?");
        let results = semantic_search(&store, &embedder, &params).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary, "fresh roadblock");
    }

    #[tokio::test]
    async fn test_ranking_prefers_vocabulary_overlap() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .insert_events(vec![
                event("sunny weather expected downtown", "weather", 10),
                event("armed kidnapping gang seized vehicle", "kidnapping", 20),
            ])
            .unwrap();

        let embedder = MockEmbeddingProvider::new(256);
        let mut params =
            params_without_location("kidnapping gang armed vehicle seized danger");
        params.event_types = vec!["kidnapping".to_string()];

        let results = semantic_search(&store, &embedder, &params).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event_type, "kidnapping");
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_recency() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let mut batch = Vec::new();
        for i in 0..20 {
            batch.push(event(&format!("incident {}", i), "insecurity", i));
        }
        store.insert_events(batch).unwrap();

        let embedder = FailingEmbeddingProvider;
        let params = params_without_location("what happened?");
        let results = semantic_search(&store, &embedder, &params).await;

        assert_eq!(results.len(), SEMANTIC_TOP_K);
        assert_eq!(results[0].summary, "incident 0");
        for pair in results.windows(2) {
            assert!(pair[0].timestamp_start >= pair[1].timestamp_start);
        }
    }

    /// Embeds single texts normally but returns only the first vector
    /// for multi-text batches, leaving later candidates unembedded.
    #[derive(Debug)]
    struct TruncatingEmbeddingProvider {
        inner: MockEmbeddingProvider,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for TruncatingEmbeddingProvider {
        fn provider_name(&self) -> &str {
            "truncating"
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        async fn embed_batch(&self, texts: &[String]) -> veye_core::AppResult<Vec<Vec<f32>>> {
            let mut embeddings = self.inner.embed_batch(texts).await?;
            embeddings.truncate(1);
            Ok(embeddings)
        }
    }

    #[tokio::test]
    async fn test_unembedded_event_scores_zero_instead_of_dropping() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .insert_events(vec![
                // Pool order is recency desc: this one embeds
                event("roadblock burning tires on the road", "roadblock", 10),
                // This one gets no vector back from the batch
                event("armed kidnapping near the market", "kidnapping", 20),
            ])
            .unwrap();

        let embedder = TruncatingEmbeddingProvider {
            inner: MockEmbeddingProvider::new(128),
        };
        let params = params_without_location("roadblock burning tires");
        let results = semantic_search(&store, &embedder, &params).await;

        // The candidate without an embedding stays in the results,
        // ranked last, rather than being excluded
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].event_type, "roadblock");
        assert_eq!(results[1].event_type, "kidnapping");
    }

    #[tokio::test]
    async fn test_top_k_cap_after_ranking() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let mut batch = Vec::new();
        for i in 0..30 {
            batch.push(event(&format!("protest march number {}", i), "protest", i));
        }
        store.insert_events(batch).unwrap();

        let embedder = MockEmbeddingProvider::new(64);
        let params = params_without_location("protest march");
        let results = semantic_search(&store, &embedder, &params).await;

        assert_eq!(results.len(), SEMANTIC_TOP_K);
    }

    #[tokio::test]
    async fn test_arc_dyn_usage_compiles() {
        // The pipeline holds these as trait objects; keep that shape honest
        let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(8));
        let params = params_without_location("q");
        let results = semantic_search(store.as_ref(), embedder.as_ref(), &params).await;
        assert!(results.is_empty());
    }
}
