//! Composed filter queries over the event store.

use crate::event::Severity;
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use veye_core::{AppError, AppResult};

/// Hard cap on rows returned by any structured query.
///
/// Protects downstream context assembly from unbounded growth.
pub const MAX_RESULTS: usize = 100;

/// Compiled, case-insensitive location pattern.
///
/// Evaluated against stored event locations. Pattern sources are
/// produced by the geographic resolver, which escapes any character
/// with regex significance before rule construction.
#[derive(Debug, Clone)]
pub struct LocationPattern {
    regex: regex::Regex,
    source: String,
}

impl LocationPattern {
    /// Compile a pattern. Matching is always case-insensitive.
    pub fn new(pattern: &str) -> AppResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Store(format!("Invalid location pattern: {}", e)))?;

        Ok(Self {
            regex,
            source: pattern.to_string(),
        })
    }

    /// Test a stored event location against the pattern.
    pub fn matches(&self, location: &str) -> bool {
        self.regex.is_match(location.trim())
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A structured read query over the event store.
///
/// Every clause is optional; an empty query returns the most recent
/// events up to the cap. Results are always ordered by
/// `timestamp_start` descending.
#[derive(Debug, Clone)]
pub struct StoreQuery {
    /// Location clause; None means no location constraint
    pub location: Option<LocationPattern>,

    /// Event-type set membership; empty means no type constraint
    pub event_types: Vec<String>,

    /// Severity floor; includes this level and everything worse
    pub min_severity: Option<Severity>,

    /// Only events with `timestamp_start` at or after this instant
    pub since: Option<DateTime<Utc>>,

    /// Result cap, never above [`MAX_RESULTS`]
    pub limit: usize,
}

impl Default for StoreQuery {
    fn default() -> Self {
        Self {
            location: None,
            event_types: Vec::new(),
            min_severity: None,
            since: None,
            limit: MAX_RESULTS,
        }
    }
}

impl StoreQuery {
    /// Create an unconstrained query (recent events, capped).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the location clause.
    pub fn with_location(mut self, pattern: LocationPattern) -> Self {
        self.location = Some(pattern);
        self
    }

    /// Set the event-type clause.
    pub fn with_event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = event_types;
        self
    }

    /// Set the severity floor.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Set the time cutoff.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Lower the result cap. Values above [`MAX_RESULTS`] are clamped.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_RESULTS);
        self
    }

    /// Severity names admitted by the floor, for SQL set membership.
    pub fn admitted_severities(&self) -> Option<Vec<&'static str>> {
        self.min_severity
            .map(|floor| floor.at_or_above().iter().map(|s| s.as_str()).collect())
    }
}
