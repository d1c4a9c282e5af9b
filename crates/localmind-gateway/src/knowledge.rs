// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct access to the long-term fact index.
//!
//! `search` is a debugging aid; `add` stores a fact without a chat turn.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::handlers::{error_response, StatusResponse};
use crate::server::GatewayState;

const EMBEDDING_FAILED: &str = "Failed to generate embedding";

fn default_limit() -> usize {
    3
}

/// Request body for `POST /knowledge/search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<String>,
}

/// Request body for `POST /knowledge/add`.
#[derive(Debug, Deserialize)]
pub struct AddFactRequest {
    pub text: String,
}

/// POST /knowledge/search
pub async fn search(
    State(state): State<GatewayState>,
    Json(body): Json<SearchRequest>,
) -> Response {
    let model = state.active_model.get();
    let vector = match state.generation.embed(&model, &body.query).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "knowledge search embedding failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, EMBEDDING_FAILED);
        }
    };

    let results = state.index.search(&vector, body.limit).await;
    Json(SearchResponse { results }).into_response()
}

/// POST /knowledge/add
pub async fn add(
    State(state): State<GatewayState>,
    Json(body): Json<AddFactRequest>,
) -> Response {
    let text = body.text.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    let model = state.active_model.get();
    let vector = match state.generation.embed(&model, text).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "knowledge add embedding failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, EMBEDDING_FAILED);
        }
    };

    match state.index.upsert(text, &vector).await {
        Ok(()) => StatusResponse::success("Fact added to knowledge base").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "knowledge add upsert failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_limit_defaults_to_three() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "tea"}"#).unwrap();
        assert_eq!(req.limit, 3);
    }
}
