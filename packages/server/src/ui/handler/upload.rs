//! File upload endpoint.
//!
//! Files are stored as `<uploads_dir>/<unix-millis>-<sanitized name>` and served
//! back under `/uploads/`. Announcing the file in a room is a separate
//! `file-upload` WebSocket event.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::{infrastructure::dto::http::UploadResponseDto, ui::state::AppState};

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

type UploadError = (StatusCode, Json<serde_json::Value>);

fn upload_error(status: StatusCode, message: &str) -> UploadError {
    (status, Json(serde_json::json!({"error": message})))
}

/// Store the multipart field `file`
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponseDto>, UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed multipart body: {}", e);
        upload_error(StatusCode::BAD_REQUEST, "Malformed multipart body")
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or(FILE_FIELD).to_string();
        let file_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read upload '{}': {}", original_name, e);
            upload_error(StatusCode::BAD_REQUEST, "Failed to read uploaded file")
        })?;

        let stored_name = format!(
            "{}-{}",
            state.clock.now().timestamp_millis(),
            sanitize_file_name(&original_name)
        );
        let path = state.uploads_dir.join(&stored_name);
        let stored = async {
            tokio::fs::create_dir_all(&state.uploads_dir).await?;
            tokio::fs::write(&path, &bytes).await
        }
        .await;
        if let Err(e) = stored {
            tracing::error!("Failed to store upload '{}': {}", stored_name, e);
            return Err(upload_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store file",
            ));
        }

        tracing::info!("Stored upload '{}' ({} bytes)", stored_name, bytes.len());
        return Ok(Json(UploadResponseDto {
            file_name: original_name,
            file_url: format!("/uploads/{}", stored_name),
            file_size: bytes.len() as u64,
            file_type,
        }));
    }

    Err(upload_error(StatusCode::BAD_REQUEST, "No file uploaded"))
}

/// ディレクトリ成分を取り除き、安全な文字以外を `_` に置き換える
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim_matches('.').is_empty() {
        FILE_FIELD.to_string()
    } else {
        sanitized
    }
}
