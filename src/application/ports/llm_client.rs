use async_trait::async_trait;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `system` carries the persona and task framing, `prompt` the user turn.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
