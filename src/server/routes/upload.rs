//! PDF upload endpoint

use axum::extract::{Multipart, State};
use axum::Json;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::UploadResponse;

/// POST /api/upload
///
/// Accepts one PDF as a multipart `file` field. Failures return a
/// structured error with an appropriate status instead of a success body
/// with zeroed counts.
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidUpload(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(sanitize_filename)
            .ok_or_else(|| Error::InvalidUpload("File field has no filename".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("Failed to read upload: {}", e)))?;

        tracing::info!("Received upload '{}' ({} bytes)", filename, data.len());
        let response = state.ingest_document(&filename, &data).await?;
        return Ok(Json(response));
    }

    Err(Error::InvalidUpload(
        "Request contained no 'file' field".to_string(),
    ))
}

/// Strip any path components a client might smuggle into the filename
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("C:\\docs\\manual.pdf"), "manual.pdf");
        assert_eq!(sanitize_filename("  manual.pdf "), "manual.pdf");
    }
}
