//! Ingest command handler.
//!
//! Reads raw community messages from a JSON file and runs them through
//! analysis into the event store.

use clap::Args;
use std::path::PathBuf;
use veye_core::{AppConfig, AppError, AppResult};
use veye_retrieval::{MessageAnalyzer, RawMessage};

/// Ingest raw community messages into the event store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// JSON file containing an array of messages
    /// ([{"id": "...", "text": "...", "timestamp": "..."}])
    #[arg(short, long)]
    pub file: PathBuf,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(file = ?self.file, "Executing ingest command");

        let contents = std::fs::read_to_string(&self.file).map_err(|e| {
            AppError::Config(format!("Failed to read messages file {:?}: {}", self.file, e))
        })?;

        let messages: Vec<RawMessage> = serde_json::from_str(&contents).map_err(|e| {
            AppError::Serialization(format!("Messages file is not a JSON array: {}", e))
        })?;

        if messages.is_empty() {
            println!("No messages to ingest.");
            return Ok(());
        }

        let store = super::open_store(config)?;
        let chat = super::build_chat_client(config)?;
        let analyzer = MessageAnalyzer::new(chat, &config.extraction_model);

        let stored = analyzer.ingest(store.as_ref(), &messages).await?;

        println!(
            "Ingested {} message(s) into {} event(s).",
            messages.len(),
            stored.len()
        );
        for event in &stored {
            println!(
                "  [{}] {} ({}, {})",
                event.id, event.summary, event.event_type, event.severity
            );
        }

        Ok(())
    }
}
