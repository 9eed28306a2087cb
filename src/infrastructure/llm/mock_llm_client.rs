use crate::application::ports::{LlmClient, LlmClientError};

/// Offline stand-in selected with `llm.provider = "mock"`. Answers every
/// stage with a short canned text derived from the system prompt.
pub struct MockLlmClient;

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, system: &str, _prompt: &str) -> Result<String, LlmClientError> {
        let persona = system.lines().next().unwrap_or("analyst");
        Ok(format!("[mock] {}: no model configured, analysis skipped.", persona))
    }
}
