//! LLM integration crate for Veye.
//!
//! This crate provides a provider-agnostic abstraction for the three
//! external capabilities the retrieval pipeline consumes:
//! - Chat completions (query understanding and answer generation)
//! - Embeddings (semantic fallback ranking), with a prioritized
//!   fallback chain over model identifiers
//!
//! # Example
//! ```no_run
//! use veye_llm::{ChatClient, ChatRequest, providers::OpenAiCompatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::new("https://router.huggingface.co/v1", "token")?;
//! let request = ChatRequest::new("Eske gen blokis nan Delmas?", "deepseek-ai/DeepSeek-V3");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod embedding;
pub mod providers;

// Re-export main types
pub use client::{strip_markdown_fences, ChatClient, ChatRequest, ChatResponse, ChatUsage};
pub use embedding::{EmbeddingChain, EmbeddingProvider};
pub use providers::{OpenAiCompatClient, OpenAiEmbeddingProvider};
