use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{SearchHit, WebSearch, WebSearchError};

const DEFAULT_SERPER_URL: &str = "https://google.serper.dev/search";

/// Google search through serper.dev.
pub struct SerperSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_SERPER_URL.to_string(),
            api_key: api_key.into(),
            max_results: 5,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl WebSearch for SerperSearchClient {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, WebSearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: self.max_results,
            })
            .send()
            .await
            .map_err(|e| WebSearchError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WebSearchError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .organic
            .into_iter()
            .take(self.max_results)
            .map(|r| SearchHit {
                title: r.title,
                link: r.link,
                snippet: r.snippet,
            })
            .collect())
    }
}
