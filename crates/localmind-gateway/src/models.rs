// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model administration: list, select, pull, and delete generation models.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localmind_core::ModelInfo;
use serde::{Deserialize, Serialize};

use crate::handlers::{error_response, StatusResponse};
use crate::server::GatewayState;

/// Request body naming a model.
#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ModelInfo>,
    pub active_model: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveModelResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub active_model: String,
}

/// GET /llm/models
pub async fn list(State(state): State<GatewayState>) -> Response {
    match state.models.list_models().await {
        Ok(models) => Json(ModelListResponse {
            models,
            active_model: state.active_model.get().to_string(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "listing models failed");
            error_response(StatusCode::BAD_GATEWAY, format!("Failed to fetch models: {e}"))
        }
    }
}

/// GET /llm/active
pub async fn get_active(State(state): State<GatewayState>) -> Json<ActiveModelResponse> {
    Json(ActiveModelResponse {
        status: None,
        active_model: state.active_model.get().to_string(),
    })
}

/// POST /llm/active
///
/// Takes effect from the next turn; turns already streaming keep their model.
pub async fn set_active(
    State(state): State<GatewayState>,
    Json(body): Json<ModelRequest>,
) -> Response {
    let name = body.name.trim();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "model name must not be empty");
    }

    state.active_model.set(name);
    tracing::info!(model = name, "active model changed");
    Json(ActiveModelResponse {
        status: Some("success"),
        active_model: name.to_string(),
    })
    .into_response()
}

/// POST /llm/pull
///
/// The pull runs on the task pool; this returns as soon as it is submitted.
pub async fn pull(
    State(state): State<GatewayState>,
    Json(body): Json<ModelRequest>,
) -> Response {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "model name must not be empty");
    }

    let models = state.models.clone();
    let pulled = name.clone();
    state.tasks.spawn("model-pull", async move {
        let result = models.pull_model(&pulled).await;
        if result.is_ok() {
            tracing::info!(model = %pulled, "model pulled");
        }
        result
    });

    Json(StatusResponse {
        status: "started",
        message: format!("Pulling model {name} in background"),
    })
    .into_response()
}

/// DELETE /llm/{name}
pub async fn delete(State(state): State<GatewayState>, Path(name): Path<String>) -> Response {
    match state.models.delete_model(&name).await {
        Ok(true) => StatusResponse::success(format!("Deleted {name}")).into_response(),
        Ok(false) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete model"),
        Err(e) => {
            tracing::warn!(model = %name, error = %e, "model delete failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete model")
        }
    }
}
