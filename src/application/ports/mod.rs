mod analysis_engine;
mod document_reader;
mod job_queue;
mod job_repository;
mod llm_client;
mod repository_error;
mod staging_store;
mod web_search;

pub use analysis_engine::{AnalysisEngine, AnalysisEngineError, AnalysisRequest};
pub use document_reader::{DocumentReader, DocumentReaderError};
pub use job_queue::{JobQueue, QueueError};
pub use job_repository::JobRepository;
pub use llm_client::{LlmClient, LlmClientError};
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use web_search::{SearchHit, WebSearch, WebSearchError};
