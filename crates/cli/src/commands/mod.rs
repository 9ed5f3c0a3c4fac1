//! Command handlers for the Veye CLI.
//!
//! This module organizes all CLI commands into separate submodules and
//! holds the shared wiring that turns a loaded configuration into a
//! running retrieval engine.

pub mod ask;
pub mod events;
pub mod ingest;
pub mod summary;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use events::EventsCommand;
pub use ingest::IngestCommand;
pub use summary::SummaryCommand;

use std::sync::Arc;
use veye_core::{AppConfig, AppResult};
use veye_llm::{
    ChatClient, EmbeddingChain, EmbeddingProvider, OpenAiCompatClient, OpenAiEmbeddingProvider,
};
use veye_retrieval::RetrievalEngine;
use veye_store::{EventStore, SqliteEventStore};

/// Open the configured event store.
pub fn open_store(config: &AppConfig) -> AppResult<Arc<dyn EventStore>> {
    let store = SqliteEventStore::open(&config.db_path)?;
    Ok(Arc::new(store))
}

/// Build the chat client against the configured endpoint.
pub fn build_chat_client(config: &AppConfig) -> AppResult<Arc<dyn ChatClient>> {
    let api_key = config.resolve_api_key()?;
    let client = OpenAiCompatClient::new(&config.api_base, api_key)?;
    Ok(Arc::new(client))
}

/// Build the embedding fallback chain from the configured model ids.
pub fn build_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let api_key = config.resolve_api_key()?;

    let mut providers: Vec<Arc<dyn EmbeddingProvider>> = Vec::new();
    for model in &config.embedding_models {
        providers.push(Arc::new(OpenAiEmbeddingProvider::new(
            &config.api_base,
            &api_key,
            model,
        )?));
    }

    Ok(Arc::new(EmbeddingChain::new(providers)))
}

/// Assemble the full retrieval engine from the configuration.
pub fn build_engine(config: &AppConfig) -> AppResult<RetrievalEngine> {
    RetrievalEngine::new(
        open_store(config)?,
        build_chat_client(config)?,
        build_embedder(config)?,
        &config.extraction_model,
        &config.generation_model,
    )
}
