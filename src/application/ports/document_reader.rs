use async_trait::async_trait;

/// Turns a staged document into plain text for the analysis prompts.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn extract_text(&self, data: &[u8]) -> Result<String, DocumentReaderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentReaderError {
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("no text found in document")]
    NoTextFound,
}
