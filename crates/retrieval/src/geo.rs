//! Geographic hierarchy resolution for Haitian place names.
//!
//! Haitian locations follow two naming conventions that must never be
//! confused:
//!
//! - **Numbered subdivisions**: "Delmas 19", "Delmas 33", "Delmas 40B"
//!   are official subzones of the commune of Delmas. A question about
//!   "Delmas" in general should cover all of them.
//! - **Compound names sharing a root**: "Carrefour Feuilles",
//!   "Carrefour Drouillard", "Carrefour Vincent" are independent zones
//!   that merely start with the same word as the commune of Carrefour.
//!   They are never folded into it.
//!
//! Only zones listed in the hand-curated hierarchy table are treated
//! as parents; everything else gets exact matching. An unrecognized
//! "general" zone must not silently over-match.

use veye_core::AppResult;
use veye_store::LocationPattern;

/// A parent zone with its accepted spelling and language variants.
///
/// Variants are compared case-insensitively against the query text;
/// the parent name is what the match rule is built from.
pub struct GeographicZone {
    /// Canonical parent name as stored in events
    pub parent: &'static str,

    /// Accepted name variants (lowercase)
    pub variants: &'static [&'static str],
}

/// Hand-curated hierarchy of parent zones with numbered subdivisions.
///
/// Deliberately short: only communes whose subzones carry a numeric or
/// compound suffix of the parent's name belong here. Coverage gaps are
/// a known maintenance liability and are not papered over with fuzzy
/// matching.
pub const HIERARCHY: &[GeographicZone] = &[
    GeographicZone {
        parent: "Delmas",
        variants: &["delmas", "dèlmas", "delma"],
    },
    GeographicZone {
        parent: "Pelerin",
        variants: &["pelerin", "pélerin", "pèlerin"],
    },
    GeographicZone {
        parent: "Martissant",
        variants: &["martissant", "matisan"],
    },
    GeographicZone {
        parent: "Tabarre",
        variants: &["tabarre", "tabar"],
    },
];

/// How a resolved location should be matched against stored events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Match the normalized name exactly (case-insensitive)
    Exact(String),

    /// Match the parent name alone or followed by a suffix
    /// ("Delmas", "Delmas 19", "Delmas 40B")
    ParentPrefix(String),
}

impl MatchRule {
    /// Render the rule as a regex pattern source.
    ///
    /// Zone names are escaped so characters with regex significance
    /// (e.g., the hyphen group in "Pétion-Ville") stay literal.
    pub fn pattern(&self) -> String {
        match self {
            MatchRule::Exact(name) => format!("^{}$", regex::escape(name)),
            MatchRule::ParentPrefix(parent) => {
                format!("^{}(\\s+.*)?$", regex::escape(parent))
            }
        }
    }

    /// Compile the rule into a store-side location pattern.
    pub fn to_location_pattern(&self) -> AppResult<LocationPattern> {
        LocationPattern::new(&self.pattern())
    }
}

/// Resolve a free-text location name to a match rule.
///
/// If `is_general` is set and the name is a listed variant of a parent
/// zone, the rule covers the parent and its suffixed subzones.
/// Otherwise the rule is an exact match on the trimmed name — both for
/// explicit subzone queries and for "general" names the hierarchy does
/// not know, which must not over-match.
///
/// Pure and deterministic given the static table.
pub fn resolve(location_text: &str, is_general: bool) -> MatchRule {
    let trimmed = location_text.trim();

    if is_general {
        let lowered = trimmed.to_lowercase();
        for zone in HIERARCHY {
            if zone.variants.iter().any(|v| *v == lowered) {
                return MatchRule::ParentPrefix(zone.parent.to_string());
            }
        }
    }

    MatchRule::Exact(trimmed.to_string())
}
