//! Prompt templates for extraction, grounded answering, and summaries.
//!
//! Templates with variables are rendered through Handlebars; static
//! system prompts are plain constants. The grounded-answer and summary
//! prompts carry the Haitian geography interpretation rules so the
//! generation step never invents hierarchy the resolver did not apply.

use handlebars::Handlebars;
use serde_json::json;
use veye_core::{AppError, AppResult};

/// System prompt for the query-parameter extraction exchange.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "\
You analyze questions about public safety and mobility in Haiti. \
Given a user question, return ONLY a JSON object with these fields:\n\
- \"query_type\": one of \"location\", \"event_type\", \"severity\", \"combined\", \"general\"\n\
- \"location\": place name mentioned in the question, or null\n\
- \"location_is_general\": true when the user means a whole commune \
(e.g., \"Delmas\" covering \"Delmas 19\", \"Delmas 33\"), false for a \
specific zone (e.g., \"Delmas 19\", \"Carrefour Feuilles\")\n\
- \"event_types\": array of incident categories among roadblock, gunshots, \
fire, kidnapping, protest, accident, weather, insecurity, traffic, other\n\
- \"severity\": minimum severity the user cares about (\"critical\", \
\"high\", \"medium\", \"low\"), or null\n\
- \"time_range\": one of \"today\", \"yesterday\", \"last_24h\", \"last_week\", \"any\"\n\
- \"language\": BCP-47 tag of the question's language (\"ht\", \"fr\", \"en\", \"es\")\n\
Questions may be in Haitian Creole, French, English, or Spanish. \
Return JSON only, no prose.";

/// System prompt for turning raw field messages into structured events.
pub const INGEST_SYSTEM_PROMPT: &str = "\
You analyze raw community messages reporting public safety and mobility \
incidents in Haiti (Haitian Creole, French, English, or Spanish). \
Group messages describing the same incident and return ONLY a JSON \
object of the form {\"events\": [...]} where each event has:\n\
- \"event_type\": one of roadblock, gunshots, fire, kidnapping, protest, \
accident, weather, insecurity, traffic, other\n\
- \"severity\": \"critical\", \"high\", \"medium\", or \"low\"\n\
- \"location\": the zone name exactly as written in the messages \
(e.g., \"Delmas 19\", \"Carrefour Feuilles\"). Never generalize or invent \
a location.\n\
- \"timestamp_start\": RFC 3339 UTC instant the incident began\n\
- \"timestamp_end\": RFC 3339 UTC instant it ended, or null if ongoing\n\
- \"summary\": one factual sentence describing the incident\n\
- \"recommended_action\": short practical advice, or null\n\
- \"messages_used\": array of ids of the source messages\n\
Report only incidents actually described. Return JSON only, no prose.";

/// System prompt for grounded answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are Veye, an AI assistant summarizing verified public safety and \
mobility alerts for Haitian cities.\n\
\n\
INTERPRETATION RULES BASED ON HAITIAN GEOGRAPHY (critical):\n\
1. Locations like \"Delmas 19\", \"Delmas 33\", \"Pelerin 5\", \
\"Martissant 23\", \"Tabarre 27\" ARE official subdivisions of Delmas, \
Pelerin, Martissant and Tabarre. When asked about the parent commune, \
treat events in its numbered zones as part of it.\n\
2. Locations such as \"Carrefour Feuilles\", \"Carrefour Drouillard\" or \
\"Carrefour Vincent\" are NOT subdivisions of Carrefour. They are \
separate zones that merely share a name root. Never merge them with \
Carrefour; report them as distinct areas.\n\
3. NEVER invent locations, subdivisions, or relations between zones. \
Use ONLY what is explicitly present in the event list.\n\
\n\
If the event context is the literal string NO_EVENTS, say clearly that \
no incidents were reported for the request and that the situation \
appears calm, without inventing details.\n\
Base everything on the provided events, mention sources exactly as \
provided, and keep answers short and practical.";

/// User-prompt template for grounded answering.
const ANSWER_USER_TEMPLATE: &str = "\
User question:
{{question}}

Events detected:
{{context}}

Respond in the language tagged \"{{language}}\".";

/// Prompt template for the summary-by-location feature.
const SUMMARY_TEMPLATE: &str = "\
Summarize the security situation for \"{{location}}\" based ONLY on the
events below. Respect the Haitian geography rules. Identify risks
strictly from the data, provide a short structured état des lieux,
mention sources exactly as provided, and keep it to 2-3 short
paragraphs. Use familiar Haitian alert phrasing such as \"État des
lieux :\", \"Voici ce qu'il faut retenir :\", \"Zones concernées :\".

EVENTS DETECTED (last 24h):
{{context}}

Produce ONLY the final summary.";

/// Registered prompt templates.
pub struct PromptRenderer {
    registry: Handlebars<'static>,
}

impl PromptRenderer {
    /// Register all templates. Fails only on a malformed template,
    /// which is a programming error caught at construction.
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry
            .register_template_string("answer_user", ANSWER_USER_TEMPLATE)
            .map_err(|e| AppError::Retrieval(format!("Bad answer template: {}", e)))?;
        registry
            .register_template_string("summary", SUMMARY_TEMPLATE)
            .map_err(|e| AppError::Retrieval(format!("Bad summary template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Render the grounded-answer user prompt.
    pub fn answer_user(&self, question: &str, context: &str, language: &str) -> AppResult<String> {
        self.registry
            .render(
                "answer_user",
                &json!({ "question": question, "context": context, "language": language }),
            )
            .map_err(|e| AppError::Retrieval(format!("Failed to render answer prompt: {}", e)))
    }

    /// Render the summary-by-location prompt.
    pub fn summary(&self, location: &str, context: &str) -> AppResult<String> {
        self.registry
            .render("summary", &json!({ "location": location, "context": context }))
            .map_err(|e| AppError::Retrieval(format!("Failed to render summary prompt: {}", e)))
    }
}
