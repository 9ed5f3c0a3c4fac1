//! Event records and severity ordering.
//!
//! An event is a structured, immutable fact derived from one or more
//! raw situational-report messages: what happened, where, how bad, and
//! when. Events are written once by the ingestion pipeline and only
//! read by the retrieval core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event severity, totally ordered: critical > high > medium > low.
///
/// Rank runs the other way (critical = 0) so that a severity *floor*
/// is "rank less than or equal to the requested rank".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Ordered rank: critical=0, high=1, medium=2, low=3.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// All severities at or above this level (the severity floor).
    ///
    /// A request for "medium" includes critical, high, and medium:
    /// users asking about medium risk still want to know about worse
    /// risks in the same area.
    pub fn at_or_above(&self) -> Vec<Severity> {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .filter(|s| s.rank() <= self.rank())
        .collect()
    }

    /// Parse a severity name, case-insensitive. Unknown names yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored event.
///
/// Identity is assigned by the store on insert and immutable
/// thereafter. `event_type` is an open string set rather than a closed
/// enum, to tolerate extraction-model drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identity
    pub id: String,

    /// Incident category (e.g., "roadblock", "gunshots", "fire")
    pub event_type: String,

    /// How bad it is
    pub severity: Severity,

    /// Free-text place name, matched against the geographic hierarchy
    pub location: String,

    /// When the incident started
    pub timestamp_start: DateTime<Utc>,

    /// When it ended; None means ongoing or unknown
    pub timestamp_end: Option<DateTime<Utc>>,

    /// Human-readable description
    pub summary: String,

    /// Suggested action for people in the area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,

    /// Number of distinct raw sources behind this event
    #[serde(default)]
    pub sources_count: u32,

    /// Opaque ids of the raw messages this event was derived from
    #[serde(default)]
    pub messages_used: Vec<String>,
}

/// An event record before the store has assigned it an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: String,
    pub severity: Severity,
    pub location: String,
    pub timestamp_start: DateTime<Utc>,
    #[serde(default)]
    pub timestamp_end: Option<DateTime<Utc>>,
    pub summary: String,
    #[serde(default)]
    pub recommended_action: Option<String>,
    #[serde(default)]
    pub sources_count: u32,
    #[serde(default)]
    pub messages_used: Vec<String>,
}
