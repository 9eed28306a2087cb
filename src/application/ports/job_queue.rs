use async_trait::async_trait;

use crate::domain::JobId;

/// Work queue between submission and the worker pool. Each enqueued id is
/// handed to exactly one `dequeue` caller.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job_id: JobId) -> Result<(), QueueError>;

    /// Waits for the next id. `None` once the queue is closed and drained.
    async fn dequeue(&self) -> Option<JobId>;

    /// Stops accepting new ids. Already queued ids can still be dequeued.
    async fn close(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,
    #[error("queue is closed")]
    Closed,
}
