pub mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Model response contained no output text")]
    EmptyCompletion,

    #[error("Invalid model API URL: {0}")]
    InvalidUrl(String),
}

/// A model endpoint that turns one prompt into one text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier requests are sent to (e.g., "gpt-4o")
    fn model(&self) -> &str;

    /// Run a single non-streaming completion and return the trimmed text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
