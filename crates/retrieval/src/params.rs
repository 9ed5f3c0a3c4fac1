//! Query parameters extracted from a natural-language question.
//!
//! One [`QueryParameters`] value exists per incoming question. Every
//! field has a defined default so a malformed extraction never produces
//! an unusable parameter set: the parse function only fills fields it
//! can validate and falls back to defaults for the rest.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use veye_store::Severity;

/// Classification of what a question is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Location,
    EventType,
    Severity,
    Combined,
    General,
}

impl QueryType {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "location" => Some(QueryType::Location),
            "event_type" => Some(QueryType::EventType),
            "severity" => Some(QueryType::Severity),
            "combined" => Some(QueryType::Combined),
            "general" => Some(QueryType::General),
            _ => None,
        }
    }
}

/// Requested time window, resolved to a cutoff instant at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Today,
    Yesterday,
    Last24h,
    LastWeek,
    Any,
}

impl TimeRange {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(TimeRange::Today),
            "yesterday" => Some(TimeRange::Yesterday),
            "last_24h" | "last24h" => Some(TimeRange::Last24h),
            "last_week" | "lastweek" => Some(TimeRange::LastWeek),
            "any" | "all" => Some(TimeRange::Any),
            _ => None,
        }
    }

    /// Resolve to a cutoff instant; events with `timestamp_start` at or
    /// after the cutoff pass the filter. `Any` means no cutoff.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc());

        match self {
            TimeRange::Today => midnight,
            TimeRange::Yesterday => midnight.map(|m| m - Duration::days(1)),
            TimeRange::Last24h => Some(now - Duration::hours(24)),
            TimeRange::LastWeek => Some(now - Duration::days(7)),
            TimeRange::Any => None,
        }
    }
}

/// Default language tag when detection fails: Haitian Creole.
pub const DEFAULT_LANGUAGE: &str = "ht";

/// Structured filter specification extracted from one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Query classification tag
    pub query_type: QueryType,

    /// Place name, if the question mentions one
    pub location: Option<String>,

    /// Whether to treat the location as a hierarchy parent
    pub location_is_general: bool,

    /// Event-type filter; empty means no filter
    pub event_types: Vec<String>,

    /// Minimum-severity threshold (a floor, not an exact match)
    pub severity: Option<Severity>,

    /// Requested time window
    pub time_range: TimeRange,

    /// Detected language tag, used to pick the response language
    pub language: String,

    /// The verbatim input, retained for semantic fallback enrichment
    pub original_question: String,
}

impl QueryParameters {
    /// The fail-closed default parameter set for a question.
    pub fn default_for(question: &str) -> Self {
        Self {
            query_type: QueryType::General,
            location: None,
            location_is_general: false,
            event_types: Vec::new(),
            severity: None,
            time_range: TimeRange::Any,
            language: DEFAULT_LANGUAGE.to_string(),
            original_question: question.to_string(),
        }
    }

    /// Build parameters from a model response, field by field.
    ///
    /// Missing or type-mismatched fields are replaced by defaults,
    /// never rejected wholesale. This function cannot fail.
    pub fn from_model_response(value: &Value, question: &str) -> Self {
        let mut params = Self::default_for(question);

        if let Some(s) = value.get("query_type").and_then(Value::as_str) {
            if let Some(query_type) = QueryType::parse(s) {
                params.query_type = query_type;
            }
        }

        if let Some(s) = value.get("location").and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                params.location = Some(trimmed.to_string());
            }
        }

        if let Some(b) = value.get("location_is_general").and_then(Value::as_bool) {
            params.location_is_general = b;
        }

        if let Some(types) = value.get("event_types").and_then(Value::as_array) {
            params.event_types = types
                .iter()
                .filter_map(Value::as_str)
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }

        if let Some(s) = value.get("severity").and_then(Value::as_str) {
            params.severity = Severity::parse(s);
        }

        if let Some(s) = value.get("time_range").and_then(Value::as_str) {
            if let Some(time_range) = TimeRange::parse(s) {
                params.time_range = time_range;
            }
        }

        if let Some(s) = value.get("language").and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                params.language = trimmed.to_lowercase();
            }
        }

        params
    }

    /// Whether the structured location filter can narrow the search.
    pub fn has_location(&self) -> bool {
        self.location
            .as_deref()
            .map(|l| !l.trim().is_empty())
            .unwrap_or(false)
    }
}
