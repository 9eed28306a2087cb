use std::sync::Arc;

use chrono::Duration;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::presentation::config::{DatabaseSettings, JobStoreSetting};

use super::pg_pool::{create_pool, run_migrations};
use super::repositories::{InMemoryJobRepository, PgJobRepository};

pub struct JobStoreFactory;

impl JobStoreFactory {
    pub async fn create(
        store: JobStoreSetting,
        database: &DatabaseSettings,
        retention: Duration,
    ) -> Result<Arc<dyn JobRepository>, RepositoryError> {
        match store {
            JobStoreSetting::Memory => {
                tracing::info!("Using in-memory job store");
                Ok(Arc::new(InMemoryJobRepository::new(retention)))
            }
            JobStoreSetting::Postgres => {
                let url = database.url.as_deref().ok_or_else(|| {
                    RepositoryError::ConnectionFailed("database.url required".into())
                })?;
                let pool = create_pool(url, database.max_connections).await?;
                if database.run_migrations {
                    run_migrations(&pool).await?;
                }
                tracing::info!("Using PostgreSQL job store");
                Ok(Arc::new(PgJobRepository::new(pool, retention)))
            }
        }
    }
}
