use tokio_util::sync::CancellationToken;

/// Returns a token cancelled on SIGINT or SIGTERM. The HTTP server, the
/// workers and the retention sweeper all watch it.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = ctrl_c() => tracing::info!("Received SIGINT, initiating graceful shutdown"),
            _ = terminate() => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
        }
        trigger.cancel();
    });

    token
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for SIGINT");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
