//! Structured event query construction.
//!
//! Composes the resolved location rule with type, severity, and time
//! filters into a single [`StoreQuery`]. Severity is a floor, the
//! result cap is fixed, and ordering is most-recent-first — all
//! enforced by the store query itself.

use crate::geo;
use crate::params::QueryParameters;
use chrono::{DateTime, Utc};
use veye_core::AppResult;
use veye_store::{StoreQuery, MAX_RESULTS};

/// Build a store query from extracted parameters, resolving time
/// cutoffs against the current instant.
pub fn build_query(params: &QueryParameters) -> AppResult<StoreQuery> {
    build_query_at(params, Utc::now())
}

/// Build a store query with an explicit "now", for deterministic tests.
pub fn build_query_at(params: &QueryParameters, now: DateTime<Utc>) -> AppResult<StoreQuery> {
    let mut query = StoreQuery::new().with_limit(MAX_RESULTS);

    if let Some(location) = params.location.as_deref() {
        let trimmed = location.trim();
        if !trimmed.is_empty() {
            let rule = geo::resolve(trimmed, params.location_is_general);
            query = query.with_location(rule.to_location_pattern()?);
        }
    }

    if !params.event_types.is_empty() {
        query = query.with_event_types(params.event_types.clone());
    }

    if let Some(severity) = params.severity {
        query = query.with_min_severity(severity);
    }

    if let Some(cutoff) = params.time_range.cutoff(now) {
        query = query.with_since(cutoff);
    }

    Ok(query)
}
