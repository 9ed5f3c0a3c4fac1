//! Concrete chat and embedding provider implementations.

pub mod mock;
pub mod openai;

pub use mock::{FailingEmbeddingProvider, MockChatClient, MockEmbeddingProvider};
pub use openai::{OpenAiCompatClient, OpenAiEmbeddingProvider};
