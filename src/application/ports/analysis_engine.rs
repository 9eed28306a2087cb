use async_trait::async_trait;

use crate::domain::{AnalysisQuery, StoragePath};

use super::{DocumentReaderError, LlmClientError, StagingStoreError};

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub query: AnalysisQuery,
    pub document_path: StoragePath,
}

/// Produces the analysis text for one document. May take arbitrarily long.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisEngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisEngineError {
    #[error("document unavailable: {0}")]
    DocumentUnavailable(#[from] StagingStoreError),
    #[error("document unreadable: {0}")]
    DocumentUnreadable(#[from] DocumentReaderError),
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: LlmClientError,
    },
    #[error("pipeline has no stages")]
    EmptyPipeline,
    #[error("{0}")]
    Other(String),
}
