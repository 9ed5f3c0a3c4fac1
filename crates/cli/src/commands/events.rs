//! Events command handler.
//!
//! Shows the raw candidate events a question would retrieve, without
//! the generation step. Useful for inspecting filter behavior.

use clap::Args;
use veye_core::{AppConfig, AppError, AppResult};
use veye_retrieval::format_events;

/// Show the raw events a question would retrieve
#[derive(Args, Debug)]
pub struct EventsCommand {
    /// The question to resolve into filters
    pub question: String,

    /// Output events as JSON
    #[arg(long)]
    pub json: bool,
}

impl EventsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing events command");

        let engine = super::build_engine(config)?;
        let events = engine.retrieve_events(&self.question).await;

        if self.json {
            let json = serde_json::to_string_pretty(&events)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", format_events(&events));
        }

        Ok(())
    }
}
