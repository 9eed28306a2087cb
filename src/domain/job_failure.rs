use std::fmt;
use std::str::FromStr;

use serde::Serialize;

const FAILURE_PREFIX: &str = "Error processing financial document";

/// Why a job ended in `FAILURE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Engine,
    Timeout,
    Panicked,
    Interrupted,
    QueueUnavailable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Engine => "engine",
            FailureKind::Timeout => "timeout",
            FailureKind::Panicked => "panicked",
            FailureKind::Interrupted => "interrupted",
            FailureKind::QueueUnavailable => "queue_unavailable",
        }
    }
}

impl FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engine" => Ok(FailureKind::Engine),
            "timeout" => Ok(FailureKind::Timeout),
            "panicked" => Ok(FailureKind::Panicked),
            "interrupted" => Ok(FailureKind::Interrupted),
            "queue_unavailable" => Ok(FailureKind::QueueUnavailable),
            _ => Err(format!("Invalid failure kind: {}", s)),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure recorded on a job. `render` produces the plain text
/// clients have always received in the `result` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}: {}", FAILURE_PREFIX, self.message)
    }
}

/// Terminal result a worker writes back to the result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(String),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        JobOutcome::Failed(JobFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }
}
