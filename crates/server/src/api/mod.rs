use crate::config::ServerConfig;
use crate::shutdown::{self, GRACE_PERIOD};
use crate::sse::{self, Sessions};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ocireg_mcp::McpServer;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Shared state behind every route.
pub struct AppState {
    pub mcp: Arc<McpServer>,
    pub sessions: Arc<Sessions>,
    /// In-flight message handlers
    pub tracker: TaskTracker,
    /// Cancelled once shutdown starts; new sessions and messages get 503
    pub shutdown: CancellationToken,
    /// Parent of every session token; cancelling it ends all streams
    pub streams: CancellationToken,
}

impl AppState {
    pub fn new(mcp: McpServer) -> Self {
        Self {
            mcp: Arc::new(mcp),
            sessions: Arc::new(Sessions::new()),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            streams: CancellationToken::new(),
        }
    }
}

/// Bind `config`'s address and serve until `signal` resolves.
pub async fn serve(
    config: &ServerConfig,
    mcp: McpServer,
    signal: impl Future<Output = ()>,
) -> Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Starting {} v{} on {}", config.name, config.version, addr);

    serve_on(listener, Arc::new(AppState::new(mcp)), signal).await
}

/// Serve on an already bound listener, draining gracefully once `signal`
/// resolves.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: impl Future<Output = ()>,
) -> Result<()> {
    let app = create_router(Arc::clone(&state));
    let stop = state.shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(stop.cancelled_owned())
            .await
    });

    tokio::select! {
        _ = signal => {
            tracing::info!("Received shutdown signal");
        }
        result = &mut server => {
            return match result {
                Ok(result) => result.context("Server error"),
                Err(e) => Err(e).context("Server task failed"),
            };
        }
    }

    shutdown::drain(&state, server, GRACE_PERIOD).await;
    tracing::info!("Server shutdown complete, exiting...");
    Ok(())
}

/// Create the MCP router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sse", get(sse::open_stream))
        .route("/message", post(sse::post_message))
        .route("/health", get(health_check))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let info = state.mcp.info();
    Json(serde_json::json!({
        "status": "ok",
        "service": info.name,
        "version": info.version,
    }))
}
