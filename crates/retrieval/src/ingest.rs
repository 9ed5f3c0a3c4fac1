//! Message ingestion: raw community reports in, structured events out.
//!
//! The analyzer batches raw messages into one extraction-model call
//! that clusters them into events, then parses the response field by
//! field. A malformed event entry is skipped with a warning rather
//! than failing the whole batch; only store insertion errors surface
//! to the caller.

use crate::prompts::INGEST_SYSTEM_PROMPT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use veye_core::{AppError, AppResult};
use veye_llm::{strip_markdown_fences, ChatClient, ChatRequest};
use veye_store::{Event, EventStore, NewEvent, Severity};

/// One raw community message, as received from the reporting channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Turns raw messages into stored events via the extraction model.
pub struct MessageAnalyzer {
    chat: Arc<dyn ChatClient>,
    model: String,
}

impl MessageAnalyzer {
    pub fn new(chat: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            chat,
            model: model.into(),
        }
    }

    /// Analyze a batch of messages into event candidates.
    ///
    /// Fails on transport or JSON-shape errors; individual malformed
    /// event entries are dropped, not fatal.
    pub async fn analyze(&self, messages: &[RawMessage]) -> AppResult<Vec<NewEvent>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let listing = messages
            .iter()
            .map(|m| match m.timestamp {
                Some(ts) => format!("[{}] (id: {}) {}", ts.to_rfc3339(), m.id, m.text),
                None => format!("(id: {}) {}", m.id, m.text),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let request = ChatRequest::new(format!("Messages:\n{}", listing), &self.model)
            .with_system(INGEST_SYSTEM_PROMPT)
            .with_temperature(0.0)
            .with_json_mode();

        let response = self.chat.complete(&request).await?;
        let body = strip_markdown_fences(&response.content);
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AppError::Llm(format!("Analysis response was not JSON: {}", e)))?;

        let entries = value
            .get("events")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Llm("Analysis response has no \"events\" array".to_string()))?;

        let fallback_start = messages.iter().filter_map(|m| m.timestamp).min();
        let known_ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();

        let mut events = Vec::new();
        for entry in entries {
            match parse_event(entry, fallback_start, &known_ids) {
                Some(event) => events.push(event),
                None => {
                    tracing::warn!(entry = %entry, "Skipping malformed event entry");
                }
            }
        }

        tracing::info!(
            messages = messages.len(),
            events = events.len(),
            "Message analysis complete"
        );
        Ok(events)
    }

    /// Analyze and persist in one step, returning the stored events.
    pub async fn ingest(
        &self,
        store: &dyn EventStore,
        messages: &[RawMessage],
    ) -> AppResult<Vec<Event>> {
        let events = self.analyze(messages).await?;
        if events.is_empty() {
            return Ok(Vec::new());
        }
        store.insert_events(events)
    }
}

/// Parse one event entry. An entry without a usable location and
/// summary is unreportable and dropped.
fn parse_event(
    entry: &Value,
    fallback_start: Option<DateTime<Utc>>,
    known_ids: &[&str],
) -> Option<NewEvent> {
    let location = non_blank(entry.get("location"))?;
    let summary = non_blank(entry.get("summary"))?;

    let event_type = non_blank(entry.get("event_type"))
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| "other".to_string());

    let severity = entry
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .unwrap_or(Severity::Medium);

    let timestamp_start = parse_instant(entry.get("timestamp_start"))
        .or(fallback_start)
        .unwrap_or_else(Utc::now);
    let timestamp_end = parse_instant(entry.get("timestamp_end"));

    let messages_used: Vec<String> = entry
        .get("messages_used")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .filter(|id| known_ids.contains(id))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(NewEvent {
        event_type,
        severity,
        location,
        timestamp_start,
        timestamp_end,
        summary,
        recommended_action: non_blank(entry.get("recommended_action")),
        sources_count: messages_used.len() as u32,
        messages_used,
    })
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_instant(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use veye_llm::providers::MockChatClient;
    use veye_store::SqliteEventStore;

    fn messages() -> Vec<RawMessage> {
        vec![
            RawMessage {
                id: "m1".to_string(),
                text: "Yo mete baraj boule kawotchou Delmas 19".to_string(),
                timestamp: Some(Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap()),
            },
            RawMessage {
                id: "m2".to_string(),
                text: "Blokis total Delmas 19, pa pase la".to_string(),
                timestamp: Some(Utc.with_ymd_and_hms(2026, 8, 30, 8, 5, 0).unwrap()),
            },
        ]
    }

    #[tokio::test]
    async fn test_analyze_parses_complete_event() {
        let client = MockChatClient::with_responses(vec![
            r#"{"events": [{
                "event_type": "Roadblock",
                "severity": "high",
                "location": "Delmas 19",
                "timestamp_start": "2026-08-30T08:00:00Z",
                "timestamp_end": null,
                "summary": "Burning-tire barricade blocks Delmas 19",
                "recommended_action": "Avoid the area",
                "messages_used": ["m1", "m2", "ghost"]
            }]}"#,
        ]);
        let analyzer = MessageAnalyzer::new(Arc::new(client), "test-model");

        let events = analyzer.analyze(&messages()).await.unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type, "roadblock");
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.location, "Delmas 19");
        assert_eq!(event.recommended_action.as_deref(), Some("Avoid the area"));
        // Unknown message ids are filtered out
        assert_eq!(event.messages_used, vec!["m1", "m2"]);
        assert_eq!(event.sources_count, 2);
    }

    #[tokio::test]
    async fn test_analyze_skips_malformed_entries() {
        let client = MockChatClient::with_responses(vec![
            r#"{"events": [
                {"summary": "No location here", "severity": "high"},
                {"location": "Tabarre", "summary": "Valid event"}
            ]}"#,
        ]);
        let analyzer = MessageAnalyzer::new(Arc::new(client), "test-model");

        let events = analyzer.analyze(&messages()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, "Tabarre");
        // Defaults for fields the entry omitted
        assert_eq!(events[0].event_type, "other");
        assert_eq!(events[0].severity, Severity::Medium);
        // Start instant falls back to the earliest message timestamp
        assert_eq!(
            events[0].timestamp_start,
            Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_analyze_empty_batch_makes_no_call() {
        let analyzer = MessageAnalyzer::new(Arc::new(MockChatClient::always_failing()), "m");
        let events = analyzer.analyze(&[]).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_shapeless_response() {
        let client = MockChatClient::with_responses(vec![r#"{"incidents": []}"#]);
        let analyzer = MessageAnalyzer::new(Arc::new(client), "test-model");
        assert!(analyzer.analyze(&messages()).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_persists_events() {
        let client = MockChatClient::with_responses(vec![
            r#"{"events": [{
                "event_type": "gunshots",
                "severity": "critical",
                "location": "Martissant 23",
                "timestamp_start": "2026-08-30T10:00:00Z",
                "summary": "Sustained gunfire on the main road",
                "messages_used": ["m1"]
            }]}"#,
        ]);
        let analyzer = MessageAnalyzer::new(Arc::new(client), "test-model");
        let store = SqliteEventStore::open_in_memory().unwrap();

        let stored = analyzer.ingest(&store, &messages()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].id.is_empty());

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.location, "Martissant 23");
        assert_eq!(latest.severity, Severity::Critical);
    }
}
