//! SQLite-backed event store.
//!
//! Events live in a single `events` table. Timestamps are stored as
//! RFC 3339 UTC text with second precision, which makes the `since`
//! cutoff a plain lexicographic comparison in SQL. The location clause
//! is a compiled pattern, so it is applied row-by-row in Rust while
//! scanning in recency order; the result cap counts only matching rows.

use crate::event::{Event, NewEvent, Severity};
use crate::query::StoreQuery;
use crate::EventStore;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;
use veye_core::{AppError, AppResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id                 TEXT PRIMARY KEY,
    event_type         TEXT NOT NULL,
    severity           TEXT NOT NULL,
    location           TEXT NOT NULL,
    timestamp_start    TEXT NOT NULL,
    timestamp_end      TEXT,
    summary            TEXT NOT NULL,
    recommended_action TEXT,
    sources_count      INTEGER NOT NULL DEFAULT 0,
    messages_used      TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_events_timestamp_start ON events(timestamp_start DESC);
CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type);
";

/// Event store backed by a SQLite database.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("Failed to open event store: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store. Used by tests and dry runs.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("Failed to open in-memory store: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Store(format!("Failed to initialize schema: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Event store lock poisoned".to_string()))
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(text: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Store(format!("Invalid stored timestamp '{}': {}", text, e)))
}

/// One row of the `events` table before timestamp and JSON decoding.
struct RawRow {
    id: String,
    event_type: String,
    severity: String,
    location: String,
    timestamp_start: String,
    timestamp_end: Option<String>,
    summary: String,
    recommended_action: Option<String>,
    sources_count: u32,
    messages_used: String,
}

impl RawRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            event_type: row.get(1)?,
            severity: row.get(2)?,
            location: row.get(3)?,
            timestamp_start: row.get(4)?,
            timestamp_end: row.get(5)?,
            summary: row.get(6)?,
            recommended_action: row.get(7)?,
            sources_count: row.get(8)?,
            messages_used: row.get(9)?,
        })
    }

    fn into_event(self) -> AppResult<Event> {
        Ok(Event {
            id: self.id,
            event_type: self.event_type,
            // Stored severities are written by us; anything else is drift
            severity: Severity::parse(&self.severity).unwrap_or(Severity::Low),
            location: self.location,
            timestamp_start: parse_timestamp(&self.timestamp_start)?,
            timestamp_end: self
                .timestamp_end
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            summary: self.summary,
            recommended_action: self.recommended_action,
            sources_count: self.sources_count,
            messages_used: serde_json::from_str(&self.messages_used).unwrap_or_default(),
        })
    }
}

impl EventStore for SqliteEventStore {
    fn insert_events(&self, events: Vec<NewEvent>) -> AppResult<Vec<Event>> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to start transaction: {}", e)))?;

        let mut inserted = Vec::with_capacity(events.len());

        for new_event in events {
            let id = uuid::Uuid::new_v4().to_string();
            let messages_json = serde_json::to_string(&new_event.messages_used)?;

            tx.execute(
                "INSERT INTO events (id, event_type, severity, location, timestamp_start, \
                 timestamp_end, summary, recommended_action, sources_count, messages_used) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    new_event.event_type,
                    new_event.severity.as_str(),
                    new_event.location,
                    format_timestamp(&new_event.timestamp_start),
                    new_event.timestamp_end.as_ref().map(format_timestamp),
                    new_event.summary,
                    new_event.recommended_action,
                    new_event.sources_count,
                    messages_json,
                ],
            )
            .map_err(|e| AppError::Store(format!("Failed to insert event: {}", e)))?;

            inserted.push(Event {
                id,
                event_type: new_event.event_type,
                severity: new_event.severity,
                location: new_event.location,
                timestamp_start: new_event.timestamp_start,
                timestamp_end: new_event.timestamp_end,
                summary: new_event.summary,
                recommended_action: new_event.recommended_action,
                sources_count: new_event.sources_count,
                messages_used: new_event.messages_used,
            });
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit insert: {}", e)))?;

        tracing::debug!(count = inserted.len(), "Inserted events");
        Ok(inserted)
    }

    fn query(&self, query: &StoreQuery) -> AppResult<Vec<Event>> {
        let conn = self.lock()?;

        let mut sql = String::from(
            "SELECT id, event_type, severity, location, timestamp_start, timestamp_end, \
             summary, recommended_action, sources_count, messages_used FROM events",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut bindings: Vec<String> = Vec::new();

        if !query.event_types.is_empty() {
            let placeholders = vec!["?"; query.event_types.len()].join(", ");
            clauses.push(format!("event_type IN ({})", placeholders));
            bindings.extend(query.event_types.iter().map(|t| t.to_lowercase()));
        }

        if let Some(severities) = query.admitted_severities() {
            let placeholders = vec!["?"; severities.len()].join(", ");
            clauses.push(format!("severity IN ({})", placeholders));
            bindings.extend(severities.iter().map(|s| s.to_string()));
        }

        if let Some(since) = query.since {
            clauses.push("timestamp_start >= ?".to_string());
            bindings.push(format_timestamp(&since));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY timestamp_start DESC");

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let mut rows = stmt
            .query(params_from_iter(bindings))
            .map_err(|e| AppError::Store(format!("Failed to execute query: {}", e)))?;

        let mut events = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| AppError::Store(format!("Failed to read row: {}", e)))?
        {
            let event = RawRow::read(row)
                .map_err(|e| AppError::Store(format!("Bad row: {}", e)))?
                .into_event()?;

            // Location clause is evaluated here; the cap counts matches only
            if let Some(pattern) = &query.location {
                if !pattern.matches(&event.location) {
                    continue;
                }
            }

            events.push(event);
            if events.len() >= query.limit {
                break;
            }
        }

        Ok(events)
    }

    fn latest(&self) -> AppResult<Option<Event>> {
        let query = StoreQuery::new().with_limit(1);
        Ok(self.query(&query)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LocationPattern;
    use chrono::Duration;

    fn event_at(location: &str, event_type: &str, severity: Severity, hours_ago: i64) -> NewEvent {
        NewEvent {
            event_type: event_type.to_string(),
            severity,
            location: location.to_string(),
            timestamp_start: Utc::now() - Duration::hours(hours_ago),
            timestamp_end: None,
            summary: format!("{} at {}", event_type, location),
            recommended_action: Some("Avoid the area".to_string()),
            sources_count: 2,
            messages_used: vec!["m1".to_string(), "m2".to_string()],
        }
    }

    fn seeded_store() -> SqliteEventStore {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .insert_events(vec![
                event_at("Delmas 19", "roadblock", Severity::High, 1),
                event_at("Delmas 33", "gunshots", Severity::Critical, 2),
                event_at("Delmas-Feuilles", "protest", Severity::Medium, 3),
                event_at("Carrefour", "fire", Severity::Medium, 4),
                event_at("Carrefour Feuilles", "roadblock", Severity::Low, 5),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_insert_assigns_identity() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        let inserted = store
            .insert_events(vec![event_at("Tabarre", "traffic", Severity::Low, 1)])
            .unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(!inserted[0].id.is_empty());
    }

    #[test]
    fn test_query_orders_by_recency() {
        let store = seeded_store();
        let events = store.query(&StoreQuery::new()).unwrap();
        assert_eq!(events.len(), 5);
        for pair in events.windows(2) {
            assert!(pair[0].timestamp_start >= pair[1].timestamp_start);
        }
    }

    #[test]
    fn test_query_location_pattern_applied_before_cap() {
        let store = seeded_store();
        let pattern = LocationPattern::new("^delmas(\\s+.*)?$").unwrap();
        let events = store
            .query(&StoreQuery::new().with_location(pattern).with_limit(2))
            .unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.location.starts_with("Delmas ")));
    }

    #[test]
    fn test_query_excludes_compound_names_from_exact_match() {
        let store = seeded_store();
        let pattern = LocationPattern::new("^carrefour$").unwrap();
        let events = store
            .query(&StoreQuery::new().with_location(pattern))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, "Carrefour");
    }

    #[test]
    fn test_query_severity_floor() {
        let store = seeded_store();
        let events = store
            .query(&StoreQuery::new().with_min_severity(Severity::Medium))
            .unwrap();

        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.severity.rank() <= Severity::Medium.rank()));
    }

    #[test]
    fn test_query_severity_floor_monotonic() {
        let store = seeded_store();
        let medium = store
            .query(&StoreQuery::new().with_min_severity(Severity::Medium))
            .unwrap();
        let high = store
            .query(&StoreQuery::new().with_min_severity(Severity::High))
            .unwrap();
        let critical = store
            .query(&StoreQuery::new().with_min_severity(Severity::Critical))
            .unwrap();

        let ids = |events: &[Event]| -> Vec<String> {
            events.iter().map(|e| e.id.clone()).collect()
        };

        assert!(ids(&high).iter().all(|id| ids(&medium).contains(id)));
        assert!(ids(&critical).iter().all(|id| ids(&high).contains(id)));
    }

    #[test]
    fn test_query_event_type_filter() {
        let store = seeded_store();
        let events = store
            .query(&StoreQuery::new().with_event_types(vec!["roadblock".to_string()]))
            .unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_type == "roadblock"));
    }

    #[test]
    fn test_query_time_cutoff() {
        let store = seeded_store();
        let cutoff = Utc::now() - Duration::hours(3) - Duration::minutes(30);
        let events = store
            .query(&StoreQuery::new().with_since(cutoff))
            .unwrap();

        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_latest() {
        let store = seeded_store();
        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.location, "Delmas 19");
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let store = SqliteEventStore::open_in_memory().unwrap();
        store
            .insert_events(vec![event_at("Tabarre 27", "kidnapping", Severity::Critical, 1)])
            .unwrap();

        let events = store.query(&StoreQuery::new()).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type, "kidnapping");
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.sources_count, 2);
        assert_eq!(event.messages_used, vec!["m1", "m2"]);
        assert_eq!(event.recommended_action.as_deref(), Some("Avoid the area"));
    }
}
