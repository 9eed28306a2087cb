use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use findoc_analyzer::application::ports::{
    AnalysisEngine, JobQueue, LlmClient, StagingStore, WebSearch,
};
use findoc_analyzer::application::services::{
    RetentionSweeper, StagedAnalysisEngine, SubmissionService, UploadPolicy, WorkerOptions,
    WorkerPool, recover_jobs,
};
use findoc_analyzer::infrastructure::llm::{ChatCompletionsClient, MockLlmClient};
use findoc_analyzer::infrastructure::observability::{TracingConfig, init_tracing};
use findoc_analyzer::infrastructure::persistence::JobStoreFactory;
use findoc_analyzer::infrastructure::queue::ChannelJobQueue;
use findoc_analyzer::infrastructure::search::SerperSearchClient;
use findoc_analyzer::infrastructure::shutdown::install_shutdown_handler;
use findoc_analyzer::infrastructure::storage::LocalStagingStore;
use findoc_analyzer::infrastructure::text_processing::DocumentTextReader;
use findoc_analyzer::presentation::config::LlmProviderSetting;
use findoc_analyzer::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("failed to load settings")?;

    init_tracing(&TracingConfig::from_settings(environment, &settings.logging));

    let job_repository = JobStoreFactory::create(
        settings.jobs.store,
        &settings.database,
        settings.jobs.result_ttl(),
    )
    .await
    .context("failed to initialize job store")?;

    tokio::fs::create_dir_all(&settings.storage.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", settings.storage.upload_dir))?;
    let staging_store: Arc<dyn StagingStore> = Arc::new(
        LocalStagingStore::new(PathBuf::from(&settings.storage.upload_dir))
            .context("failed to open upload directory")?,
    );

    let job_queue: Arc<dyn JobQueue> = Arc::new(ChannelJobQueue::new(settings.jobs.queue_capacity));

    let llm_client: Arc<dyn LlmClient> = match settings.llm.provider {
        LlmProviderSetting::OpenaiCompatible => {
            if settings.llm.api_key.is_empty() {
                tracing::warn!("No LLM API key configured; analysis calls will be rejected upstream");
            }
            Arc::new(ChatCompletionsClient::from_settings(&settings.llm))
        }
        LlmProviderSetting::Mock => {
            tracing::warn!("Using mock LLM client");
            Arc::new(MockLlmClient)
        }
    };

    let mut engine = StagedAnalysisEngine::new(
        settings.analysis.pipeline(),
        llm_client,
        Arc::new(DocumentTextReader::new()),
        Arc::clone(&staging_store),
        settings.analysis.max_document_chars,
    );
    if let Some(api_key) = settings.search.active_key() {
        let search: Arc<dyn WebSearch> = Arc::new(
            SerperSearchClient::new(api_key)
                .with_endpoint(&settings.search.endpoint)
                .with_max_results(settings.search.max_results),
        );
        engine = engine.with_web_search(search);
    } else if settings.search.enabled {
        tracing::warn!("Web search enabled but no API key configured; continuing without it");
    }
    tracing::info!(
        stages = ?engine.stages().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "Analysis pipeline configured"
    );
    let engine: Arc<dyn AnalysisEngine> = Arc::new(engine);

    let report = recover_jobs(&job_repository, &job_queue)
        .await
        .context("failed to recover jobs from a previous run")?;
    tracing::debug!(?report, "Job recovery finished");

    let shutdown = install_shutdown_handler();

    let pool = WorkerPool::new(
        settings.jobs.worker_count,
        Arc::clone(&job_queue),
        Arc::clone(&job_repository),
        engine,
        Arc::clone(&staging_store),
        WorkerOptions {
            engine_timeout: settings.jobs.engine_timeout(),
            delete_document_after_processing: settings.jobs.delete_document_after_processing,
        },
    );
    let workers = pool.spawn(shutdown.clone());

    let sweeper = RetentionSweeper::new(Arc::clone(&job_repository), settings.jobs.sweep_interval());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let submission_service = Arc::new(SubmissionService::new(
        staging_store,
        job_repository,
        Arc::clone(&job_queue),
        UploadPolicy {
            max_bytes: settings.storage.max_upload_bytes,
            allowed_content_types: settings.storage.allowed_content_types.clone(),
        },
    ));
    let state = AppState::new(submission_service, settings.jobs.unknown_job_policy);
    let app = create_router(state, settings.storage.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(address = %addr, environment = %environment, "Server listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
        .context("server error")?;

    job_queue.close().await;
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Analysis worker panicked");
        }
    }
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "Retention sweeper panicked");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
