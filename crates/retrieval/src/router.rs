//! Relevance routing: is a question about tracked events, or general
//! chit-chat?
//!
//! False negatives (treating a real safety question as small talk) are
//! worse than false positives, so the router leans in-domain whenever
//! any structural signal exists. The keyword lists are hand-maintained
//! and tied to the currently covered zones and languages.

use crate::params::{QueryParameters, QueryType};

/// Known zone names, lowercase.
const ZONE_KEYWORDS: &[&str] = &[
    "delmas",
    "carrefour",
    "petion-ville",
    "petionville",
    "pétion-ville",
    "tabarre",
    "martissant",
    "matisan",
    "pelerin",
    "port-au-prince",
    "potoprens",
    "croix-des-bouquets",
    "kwadèbouke",
    "cite soleil",
    "cité soleil",
    "site solèy",
    "kenscoff",
    "laboule",
    "canape-vert",
    "canapé-vert",
    "haiti",
    "ayiti",
];

/// Event-type vocabulary in Creole, French, and English.
const EVENT_KEYWORDS: &[&str] = &[
    "roadblock",
    "barricade",
    "baraj",
    "blokis",
    "barrage",
    "traffic",
    "anbouteyaj",
    "embouteillage",
    "gunshot",
    "gunshots",
    "fusillade",
    "tire",
    "bal tire",
    "kidnapping",
    "kidnapin",
    "enlèvement",
    "enlevement",
    "fire",
    "dife",
    "incendie",
    "protest",
    "manifestasyon",
    "manifestation",
    "accident",
    "aksidan",
    "insecurity",
    "ensekirite",
    "insécurité",
];

/// Generic security and alert vocabulary.
const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "sekirite",
    "sécurité",
    "securite",
    "safe",
    "danger",
    "danje",
    "risk",
    "risque",
    "alert",
    "alèt",
    "alerte",
    "urgent",
    "ijan",
];

/// Clearly-unrelated general-knowledge topics.
const UNRELATED_TOPICS: &[&str] = &[
    "joke",
    "blag",
    "blague",
    "recipe",
    "resèt",
    "recette",
    "cook",
    "kwit",
    "definition",
    "meaning of",
    "what does",
    "translate",
    "tradui",
    "poem",
    "powèm",
    "song",
    "chante",
    "weather forecast",
    "météo",
    "meteo",
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Decide whether a question should go through event retrieval.
///
/// Decision order (first match wins):
/// 1. A non-general `query_type` is in-domain.
/// 2. Any curated keyword (zones, event vocabulary, security
///    vocabulary) in the question text is in-domain.
/// 3. Any populated structured field is in-domain.
/// 4. A general question on a clearly-unrelated topic with no Haiti
///    context is out-of-domain.
/// 5. Default: out-of-domain (no structural signal remains by here).
pub fn is_in_domain(params: &QueryParameters, question: &str) -> bool {
    if !matches!(params.query_type, QueryType::General) {
        return true;
    }

    let lowered = question.to_lowercase();
    if contains_any(&lowered, ZONE_KEYWORDS)
        || contains_any(&lowered, EVENT_KEYWORDS)
        || contains_any(&lowered, SECURITY_KEYWORDS)
    {
        return true;
    }

    let has_structured_signal =
        params.has_location() || !params.event_types.is_empty() || params.severity.is_some();
    if has_structured_signal {
        return true;
    }

    if contains_any(&lowered, UNRELATED_TOPICS) {
        tracing::debug!("Question matches an unrelated general-knowledge topic");
        return false;
    }

    false
}
