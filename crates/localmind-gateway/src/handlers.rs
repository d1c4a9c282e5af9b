// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for service status, sessions, and session history.
//!
//! `/memory/{session_id}` predates the `/sessions` routes and is kept as an
//! alias for history reads and deletes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localmind_core::{
    ChatMessage, HealthStatus, LocalMindError, SessionMeta, DEFAULT_SESSION_TITLE,
};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Build an error response with a JSON body.
pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Map a backend error to a response. Storage outages are 503, the rest 500.
pub(crate) fn backend_error(err: &LocalMindError) -> Response {
    let status = match err {
        LocalMindError::PersistenceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, "request failed");
    error_response(status, err.to_string())
}

/// Generic `{"status", "message"}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
        })
    }
}

/// Response body for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: String,
}

/// GET /
pub async fn root(State(state): State<GatewayState>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: state.app_name.clone(),
    })
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Worst status across all adapters.
    pub status: &'static str,
    pub version: String,
    pub adapters: Vec<AdapterHealth>,
}

/// Health of a single adapter.
#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub kind: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// GET /health
///
/// Probes every adapter. Responds 503 when any of them is unhealthy.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let mut adapters = Vec::with_capacity(state.adapters.len());
    let mut worst = 0u8;

    for adapter in &state.adapters {
        let status = adapter
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        let (rank, detail) = match &status {
            HealthStatus::Healthy => (0, None),
            HealthStatus::Degraded(d) => (1, Some(d.clone())),
            HealthStatus::Unhealthy(d) => (2, Some(d.clone())),
        };
        worst = worst.max(rank);
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            kind: adapter.adapter_type().to_string(),
            status: status.label(),
            detail,
        });
    }

    let (code, label) = match worst {
        0 => (StatusCode::OK, "healthy"),
        1 => (StatusCode::OK, "degraded"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        code,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION").to_string(),
            adapters,
        }),
    )
        .into_response()
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// Live sessions, newest first.
    pub sessions: Vec<SessionMeta>,
}

/// GET /sessions
pub async fn list_sessions(State(state): State<GatewayState>) -> Response {
    match state.sessions.list_sessions().await {
        Ok(sessions) => Json(SessionListResponse { sessions }).into_response(),
        Err(e) => backend_error(&e),
    }
}

/// Request body for `POST /sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<GatewayState>,
    Json(body): Json<CreateSessionRequest>,
) -> Response {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SESSION_TITLE);

    match state.sessions.create_session(title).await {
        Ok(meta) => (StatusCode::CREATED, Json(meta)).into_response(),
        Err(e) => backend_error(&e),
    }
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.get_session(&id).await {
        Ok(Some(meta)) => Json(meta).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("session {id} not found")),
        Err(e) => backend_error(&e),
    }
}

/// Request body for `PATCH /sessions/{id}`.
#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

/// PATCH /sessions/{id}
pub async fn rename_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<RenameSessionRequest>,
) -> Response {
    let title = body.title.trim();
    if title.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "title must not be empty");
    }

    match state.sessions.get_session(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, format!("session {id} not found"));
        }
        Err(e) => return backend_error(&e),
    }

    if let Err(e) = state.sessions.update_title(&id, title).await {
        return backend_error(&e);
    }
    match state.sessions.get_session(&id).await {
        Ok(Some(meta)) => Json(meta).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("session {id} not found")),
        Err(e) => backend_error(&e),
    }
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.delete_session(&id).await {
        Ok(()) => StatusResponse::success(format!("Session {id} deleted")).into_response(),
        Err(e) => backend_error(&e),
    }
}

/// GET /sessions/{id}/history and GET /memory/{session_id}
///
/// Unknown and expired sessions have an empty history.
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Json<Vec<ChatMessage>> {
    Json(state.sessions.history(&id).await)
}

/// DELETE /memory/{session_id}
pub async fn delete_history(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.delete_session(&id).await {
        Ok(()) => {
            StatusResponse::success(format!("History cleared for session {id}")).into_response()
        }
        Err(e) => backend_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_request_title_is_optional() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
    }

    #[test]
    fn adapter_health_omits_empty_detail() {
        let json = serde_json::to_string(&AdapterHealth {
            name: "sqlite".into(),
            kind: "SessionLog".into(),
            status: "healthy",
            detail: None,
        })
        .unwrap();
        assert!(!json.contains("detail"));
    }

    #[test]
    fn persistence_errors_map_to_503() {
        let err = LocalMindError::persistence(std::io::Error::other("locked"));
        assert_eq!(backend_error(&err).status(), StatusCode::SERVICE_UNAVAILABLE);
        let err = LocalMindError::Internal("boom".into());
        assert_eq!(backend_error(&err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
