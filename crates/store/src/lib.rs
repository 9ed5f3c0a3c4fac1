//! Event store crate for Veye.
//!
//! Defines the [`Event`] data model, composed filter queries
//! ([`StoreQuery`]), and a SQLite-backed implementation of the
//! [`EventStore`] trait. The retrieval core treats the store as
//! read-only; the write path ([`EventStore::insert_events`]) belongs
//! to the message-ingestion pipeline.

pub mod event;
pub mod query;
pub mod sqlite;

pub use event::{Event, NewEvent, Severity};
pub use query::{LocationPattern, StoreQuery, MAX_RESULTS};
pub use sqlite::SqliteEventStore;

use veye_core::AppResult;

/// Trait for event store backends.
///
/// A single filtered read is assumed atomic and consistent; there is
/// no cross-row transactional requirement on the read path.
pub trait EventStore: Send + Sync {
    /// Insert a batch of new events, assigning each an identity.
    ///
    /// Returns the stored records in insertion order.
    fn insert_events(&self, events: Vec<NewEvent>) -> AppResult<Vec<Event>>;

    /// Run a filtered, recency-ordered, capped read query.
    fn query(&self, query: &StoreQuery) -> AppResult<Vec<Event>>;

    /// Fetch the single most recent event, if any.
    fn latest(&self) -> AppResult<Option<Event>>;
}
