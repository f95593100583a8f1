pub mod error;
pub mod json;
pub mod openai;

use crate::llm::error::CompletionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
}

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// One provider round-trip. Returns the raw text of the top choice.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
