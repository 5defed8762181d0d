//! Stats, health, and reset endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::{HealthResponse, ResetResponse, StatsResponse};

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.stats())
}

/// GET /api/health
///
/// Reports per-component health; the endpoint itself always answers 200 so
/// monitors can read the component breakdown
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health().await)
}

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// DELETE /api/reset
///
/// With `?session_id=` clears that session only; without it clears the
/// whole knowledge base and every session
pub async fn reset(
    State(state): State<AppState>,
    Query(params): Query<ResetParams>,
) -> Result<Json<ResetResponse>> {
    match params.session_id {
        Some(id) => {
            if !state.sessions().remove(&id) {
                return Err(Error::SessionNotFound(id));
            }
            Ok(Json(ResetResponse {
                message: format!("Session {} cleared", id),
            }))
        }
        None => Ok(Json(state.reset())),
    }
}
