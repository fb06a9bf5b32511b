use crate::api::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound on draining in-flight calls and closing streams.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Resolves on SIGINT or SIGTERM.
pub async fn signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Stop accepting work, let in-flight calls finish, then close the
/// session streams. Gives up after `grace`.
pub async fn drain(
    state: &Arc<AppState>,
    server: JoinHandle<std::io::Result<()>>,
    grace: Duration,
) {
    tracing::info!("Shutting down server...");
    state.shutdown.cancel();
    state.tracker.close();

    let abort = server.abort_handle();
    let graceful = async {
        state.tracker.wait().await;
        tracing::info!("In-flight calls finished, closing {} session(s)", state.sessions.len());
        state.streams.cancel();
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Server error during shutdown: {}", e),
            Err(e) => tracing::warn!("Server task failed during shutdown: {}", e),
        }
    };

    match tokio::time::timeout(grace, graceful).await {
        Ok(()) => tracing::info!("Server shutdown completed gracefully"),
        Err(_) => {
            tracing::warn!("Server shutdown timed out after {:?}, forcing exit", grace);
            state.streams.cancel();
            abort.abort();
        }
    }
}
