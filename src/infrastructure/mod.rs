pub mod llm;
pub mod observability;
pub mod persistence;
pub mod queue;
pub mod search;
pub mod shutdown;
pub mod storage;
pub mod text_processing;
