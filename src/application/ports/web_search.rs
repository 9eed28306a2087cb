use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, WebSearchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("search request failed: {0}")]
    RequestFailed(String),
    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}
