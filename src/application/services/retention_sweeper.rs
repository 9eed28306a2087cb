use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::JobRepository;

/// Periodically removes jobs whose retention window has elapsed. Reads already
/// hide expired jobs; this only reclaims their storage.
pub struct RetentionSweeper {
    job_repository: Arc<dyn JobRepository>,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(job_repository: Arc<dyn JobRepository>, interval: Duration) -> Self {
        Self {
            job_repository,
            interval,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.sweep().await,
            }
        }
        tracing::debug!("Retention sweeper stopped");
    }

    pub async fn sweep(&self) {
        match self.job_repository.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "Purged expired jobs"),
            Err(e) => tracing::warn!(error = %e, "Failed to purge expired jobs"),
        }
    }
}
