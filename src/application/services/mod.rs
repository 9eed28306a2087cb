mod analysis_worker;
mod job_recovery;
mod retention_sweeper;
mod staged_analysis_engine;
mod submission_service;

pub use analysis_worker::{AnalysisWorker, AnalysisWorkerError, WorkerOptions, WorkerPool};
pub use job_recovery::{RecoveryError, RecoveryReport, recover_jobs};
pub use retention_sweeper::RetentionSweeper;
pub use staged_analysis_engine::StagedAnalysisEngine;
pub use submission_service::{DocumentUpload, SubmissionError, SubmissionService, UploadPolicy};
