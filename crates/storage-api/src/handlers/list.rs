//! Folder listing handler

use crate::envelope::ResultEnvelope;
use crate::model::FileInfo;
use crate::paths::validate_folder_path;
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;

/// GET /v1/files/{*path} - List files under a folder prefix
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    list_prefix(&state, &path).await
}

/// GET /v1/files - List files from the bucket root
pub async fn list_root(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    list_prefix(&state, "").await
}

async fn list_prefix(state: &AppState, prefix: &str) -> Result<Response, ApiError> {
    validate_folder_path(prefix)?;

    let entries = state.store.list_objects(prefix).await.map_err(|e| {
        tracing::error!(prefix = %prefix, error = %e, "Failed to list objects");
        ApiError::not_found(e.to_string())
    })?;

    let files: Vec<FileInfo> = entries
        .iter()
        .filter(|entry| state.filter.is_listed(&entry.key))
        .map(|entry| FileInfo::from_entry(entry, &state.config.api_url))
        .collect();

    tracing::debug!(
        prefix = %prefix,
        listed = files.len(),
        total = entries.len(),
        "Listed files"
    );

    let mut result = ResultEnvelope::new();
    result.add_data(files);
    Ok(result.respond(StatusCode::OK))
}
