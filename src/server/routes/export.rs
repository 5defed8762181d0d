//! Conversation transcript export

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::Result;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub session_id: String,
}

/// POST /api/export
///
/// Returns the session transcript as a downloadable markdown file;
/// an unknown session is a 404
pub async fn export_markdown(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    let markdown = state.sessions().export_markdown(&request.session_id)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat-transcript.md\"",
            ),
        ],
        markdown,
    ))
}
