// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use localmind_agent::{ChatOrchestrator, TaskPool};
use localmind_config::model::GatewayConfig;
use localmind_core::{
    ActiveModel, GenerationClient, LocalMindError, ModelAdmin, PluginAdapter, RetrievalIndex,
    SessionLog,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, knowledge, models, ws};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Service name reported by `GET /`.
    pub app_name: String,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub sessions: Arc<dyn SessionLog>,
    pub index: Arc<dyn RetrievalIndex>,
    pub generation: Arc<dyn GenerationClient>,
    pub models: Arc<dyn ModelAdmin>,
    pub active_model: Arc<ActiveModel>,
    /// Pool for work that outlives a request, such as model pulls.
    pub tasks: TaskPool,
    /// Adapters probed by `GET /health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: GatewayState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ws/chat/{session_id}", get(ws::ws_chat))
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::get_session)
                .patch(handlers::rename_session)
                .delete(handlers::delete_session),
        )
        .route("/sessions/{id}/history", get(handlers::get_history))
        .route(
            "/memory/{session_id}",
            get(handlers::get_history).delete(handlers::delete_history),
        )
        .route("/knowledge/search", post(knowledge::search))
        .route("/knowledge/add", post(knowledge::add))
        .route("/llm/models", get(models::list))
        .route(
            "/llm/active",
            get(models::get_active).post(models::set_active),
        )
        .route("/llm/pull", post(models::pull))
        .route("/llm/{name}", axum::routing::delete(models::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind to the configured host:port and serve until `shutdown` fires.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LocalMindError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LocalMindError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");
    serve(listener, build_router(state, config.cors_permissive), shutdown).await
}

/// Serve `router` on an already bound listener until `shutdown` fires.
///
/// In-flight requests finish; open chat sockets end when their client goes away.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), LocalMindError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| LocalMindError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
