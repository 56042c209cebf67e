//! Batch upload handler (multipart/form-data)

use crate::envelope::ResultEnvelope;
use crate::model::{FileInfo, download_url};
use crate::paths::{join_key, normalize_folder};
use crate::{ApiError, AppState};
use axum::{
    extract::{Multipart, Query, State, multipart::MultipartRejection},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use storage_api_store::{DEFAULT_CONTENT_TYPE, PutMode, StoreError};

/// Form field holding the target folder
const FOLDER_FIELD: &str = "folder";
/// Form field holding the files, repeated once per file
const FILES_FIELD: &str = "files";

/// Query parameters for POST /v1/file
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Target folder, used when the form has no `folder` field
    pub folder: Option<String>,
    /// `true`, `1` or `yes` replaces existing files
    pub overwrite: Option<String>,
}

impl UploadParams {
    pub fn overwrite(&self) -> bool {
        self.overwrite
            .as_deref()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }
}

/// One `files` part as received
#[derive(Debug)]
struct FilePart {
    filename: String,
    /// Part body, or why it could not be read
    data: Result<Bytes, String>,
}

#[derive(Debug, Default)]
struct UploadForm {
    folder: Option<String>,
    files: Vec<FilePart>,
}

/// Drain the multipart body.
///
/// A part whose body cannot be read leaves the stream unusable, so it is
/// recorded as a failed file and parsing stops there.
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(ApiError::validation(format!(
                    "Error retrieving form data: {}",
                    e.body_text()
                )));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FOLDER_FIELD) => {
                let value = field.text().await.map_err(|e| {
                    ApiError::validation(format!("Error retrieving form data: {}", e.body_text()))
                })?;
                form.folder = Some(value);
            }
            Some(FILES_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => form.files.push(FilePart { filename, data: Ok(data) }),
                    Err(e) => {
                        form.files.push(FilePart {
                            filename,
                            data: Err(e.body_text()),
                        });
                        break;
                    }
                }
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

/// Filenames become the last key segment and must not contain separators
fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty() && !filename.contains(['/', '\\']) && filename != "." && filename != ".."
}

/// Store a single part, returning its listing entry or the per-file error
async fn store_file(
    state: &AppState,
    folder: &str,
    part: FilePart,
    overwrite: bool,
) -> Result<FileInfo, ApiError> {
    let FilePart { filename, data } = part;

    if !is_valid_filename(&filename) {
        return Err(ApiError::validation(format!("Invalid file: {}", filename)));
    }

    let key = join_key(folder, &filename);

    if !overwrite {
        match state.store.head_object(&key).await {
            Ok(_) => {
                return Err(ApiError::Conflict(format!("File already exists: {}", filename)));
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to check for existing file");
                return Err(ApiError::validation(format!(
                    "Error when checking file: {}",
                    filename
                )));
            }
        }
    }

    let data = data.map_err(|e| {
        tracing::warn!(key = %key, error = %e, "Failed to read uploaded part");
        ApiError::validation(format!("Invalid file: {}", filename))
    })?;
    let size = data.len() as u64;

    let mode = if overwrite { PutMode::Overwrite } else { PutMode::Create };
    match state.store.put_object(&key, data, DEFAULT_CONTENT_TYPE, mode).await {
        Ok(()) => {}
        Err(StoreError::AlreadyExists(_)) => {
            return Err(ApiError::Conflict(format!("File already exists: {}", filename)));
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to upload file");
            return Err(ApiError::validation(format!(
                "Error when uploading file: {}",
                filename
            )));
        }
    }

    tracing::info!(key = %key, size = size, "File uploaded");

    Ok(FileInfo {
        url: download_url(&state.config.api_url, &key),
        filename,
        folder: folder.to_string(),
        size,
        last_modified: Utc::now(),
    })
}

/// POST /v1/file - Upload one or more files into a folder
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("multipart/form-data"));
    if !is_multipart {
        return Err(ApiError::validation("Request is not a multipart/form-data"));
    }

    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Rejected multipart body");
        ApiError::validation("The request body is not a valid multipart/form-data")
    })?;

    let form = read_form(multipart).await?;

    let folder = [form.folder.as_deref(), params.folder.as_deref()]
        .into_iter()
        .flatten()
        .map(normalize_folder)
        .find(|f| !f.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation("Folder is missing"))?;

    if form.files.is_empty() {
        return Err(ApiError::validation("File(s) is missing"));
    }

    let overwrite = params.overwrite();
    let mut result: ResultEnvelope<Vec<FileInfo>> = ResultEnvelope::new();
    let mut uploaded = Vec::with_capacity(form.files.len());

    // In order; a failure only affects its own entry and nothing is rolled back
    for part in form.files {
        match store_file(&state, &folder, part, overwrite).await {
            Ok(info) => uploaded.push(info),
            Err(err) => result.add_error(err.status_code(), err.to_string()),
        }
    }

    let status = if uploaded.is_empty() {
        result.add_message("No files were uploaded successfully");
        StatusCode::BAD_REQUEST
    } else {
        result.add_message(format!("Files uploaded successfully: {}", uploaded.len()));
        result.add_data(uploaded);
        StatusCode::OK
    };

    Ok(result.respond(status))
}
