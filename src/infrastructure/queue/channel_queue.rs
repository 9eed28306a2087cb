use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{JobQueue, QueueError};
use crate::domain::JobId;

/// Bounded in-process queue. Workers share the receiver behind a fair mutex,
/// so each id is received by exactly one of them.
pub struct ChannelJobQueue {
    sender: mpsc::Sender<JobId>,
    receiver: Mutex<mpsc::Receiver<JobId>>,
    closed: CancellationToken,
    capacity: usize,
}

impl ChannelJobQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            closed: CancellationToken::new(),
            capacity,
        }
    }
}

#[async_trait]
impl JobQueue for ChannelJobQueue {
    async fn enqueue(&self, job_id: JobId) -> Result<(), QueueError> {
        if self.closed.is_cancelled() {
            return Err(QueueError::Closed);
        }
        self.sender.try_send(job_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    async fn dequeue(&self) -> Option<JobId> {
        let mut receiver = self.receiver.lock().await;
        if let Ok(job_id) = receiver.try_recv() {
            return Some(job_id);
        }
        if self.closed.is_cancelled() {
            return None;
        }
        tokio::select! {
            job_id = receiver.recv() => job_id,
            _ = self.closed.cancelled() => receiver.try_recv().ok(),
        }
    }

    async fn close(&self) {
        self.closed.cancel();
    }

    fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }
}
