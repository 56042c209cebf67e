//! Single-file handlers: download, delete, share link

use crate::envelope::ResultEnvelope;
use crate::model::ShareLink;
use crate::paths::validate_file_path;
use crate::{ApiError, AppState};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use storage_api_store::{DEFAULT_CONTENT_TYPE, PRESIGN_TTL, StoreError};

/// Safe `Content-Disposition` value forcing a download.
///
/// Control characters are dropped and quotes/backslashes replaced in the
/// plain `filename`; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// GET /v1/file/{*path} - Download a file
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let filename = validate_file_path(&path)?;

    let object = state.store.get_object(&path).await.map_err(|e| {
        tracing::debug!(key = %path, error = %e, "Download lookup failed");
        ApiError::from_lookup(e)
    })?;

    let content_type = object
        .content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition_header(filename));

    if let Some(size) = object.size {
        response = response.header(header::CONTENT_LENGTH, size);
    }

    response
        .body(Body::from_stream(object.stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// DELETE /v1/file/{*path} - Delete a file
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    validate_file_path(&path)?;

    state
        .store
        .head_object(&path)
        .await
        .map_err(ApiError::from_lookup)?;

    state.store.delete_object(&path).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::from_lookup(e),
        other => {
            tracing::error!(key = %path, error = %other, "Failed to delete object");
            ApiError::DeleteFailed(other)
        }
    })?;

    tracing::info!(key = %path, "File deleted");

    let mut result: ResultEnvelope<String> = ResultEnvelope::new();
    result.add_message("File deleted successfully");
    Ok(result.respond(StatusCode::OK))
}

/// GET /v1/link/{*path} - Presigned download link valid for one hour
pub async fn share_link(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    validate_file_path(&path)?;

    state
        .store
        .head_object(&path)
        .await
        .map_err(ApiError::from_lookup)?;

    let url = state.store.presign(&path, PRESIGN_TTL).await.map_err(|e| {
        tracing::error!(key = %path, error = %e, "Failed to presign object");
        ApiError::internal(e.to_string())
    })?;

    let mut result = ResultEnvelope::new();
    result.add_data(ShareLink {
        url,
        expires_in: PRESIGN_TTL.as_secs(),
    });
    Ok(result.respond(StatusCode::OK))
}

/// GET or DELETE /v1/file[/] - No file named
pub async fn missing_filename() -> ApiError {
    ApiError::validation("File name is missing")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_disposition() {
        assert_eq!(
            content_disposition_header("readme.txt"),
            "attachment; filename=\"readme.txt\""
        );
    }

    #[test]
    fn test_quotes_and_control_chars_are_sanitised() {
        let value = content_disposition_header("a\"b\r\n.txt");
        assert!(value.starts_with("attachment; filename=\"a_b.txt\"; filename*=UTF-8''"));
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_unicode_filename_gets_rfc5987_form() {
        let value = content_disposition_header("résumé.pdf");
        assert!(value.contains("filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
    }
}
