mod analysis_query;
mod analysis_stage;
mod job;
mod job_failure;
mod job_id;
mod job_status;
mod storage_path;

pub use analysis_query::{AnalysisQuery, DEFAULT_ANALYSIS_QUERY};
pub use analysis_stage::AnalysisStage;
pub use job::Job;
pub use job_failure::{FailureKind, JobFailure, JobOutcome};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use storage_path::StoragePath;
