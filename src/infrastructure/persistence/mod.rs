mod job_store_factory;
mod pg_pool;
mod repositories;

pub use job_store_factory::JobStoreFactory;
pub use pg_pool::{create_pool, run_migrations};
pub use repositories::{InMemoryJobRepository, PgJobRepository};
