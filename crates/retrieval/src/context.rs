//! RAG context assembly.
//!
//! Formats retrieved events into a bounded, deterministic textual
//! context for the generation step. Pure formatting: events arrive
//! already sorted and capped by the upstream stage, and this stage
//! must not re-sort them.

use chrono::SecondsFormat;
use veye_store::{Event, Severity};

/// Sentinel context for "nothing found", distinguishable from a real
/// but empty-looking context so the generation prompt can special-case
/// it.
pub const NO_EVENTS: &str = "NO_EVENTS";

/// Format events into the grounding context, one line per event in
/// arrival order.
pub fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    events.iter().map(format_event).collect::<Vec<_>>().join("\n")
}

fn format_event(event: &Event) -> String {
    let mut line = format!(
        "- [{}] {} (Type: {}, Severity: {}, Location: {}",
        event
            .timestamp_start
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        event.summary,
        event.event_type,
        event.severity,
        event.location,
    );

    if event.sources_count > 0 {
        line.push_str(&format!(", Sources: {}", event.sources_count));
    }

    if let Some(action) = &event.recommended_action {
        line.push_str(&format!(", Action: {}", action));
    }

    line.push(')');
    line
}
