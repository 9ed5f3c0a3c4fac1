//! Retrieval-augmented answering over situational safety events.
//!
//! The crate covers the full question path: geographic hierarchy
//! resolution, query-parameter extraction, structured query building,
//! semantic fallback search, relevance routing, context assembly, and
//! the end-to-end [`RetrievalEngine`], plus the ingestion path that
//! turns raw community messages into stored events.

pub mod builder;
pub mod context;
pub mod extract;
pub mod geo;
pub mod ingest;
pub mod params;
pub mod pipeline;
pub mod prompts;
pub mod router;
pub mod semantic;

pub use context::{format_events, NO_EVENTS};
pub use extract::QueryExtractor;
pub use geo::{resolve, MatchRule};
pub use ingest::{MessageAnalyzer, RawMessage};
pub use params::{QueryParameters, QueryType, TimeRange, DEFAULT_LANGUAGE};
pub use pipeline::{AnswerStatus, ChatAnswer, RetrievalEngine};
pub use router::is_in_domain;
pub use semantic::{semantic_search, SEMANTIC_TOP_K};
