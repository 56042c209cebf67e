//! Response payload types

use crate::paths::split_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storage_api_store::ObjectEntry;

/// A file as presented to API clients
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub folder: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Gateway download URL
    pub url: String,
}

impl FileInfo {
    /// Project a listing entry
    pub fn from_entry(entry: &ObjectEntry, api_url: &str) -> Self {
        let (folder, filename) = split_key(&entry.key);
        Self {
            filename: filename.to_string(),
            folder: folder.to_string(),
            size: entry.size,
            last_modified: entry.last_modified,
            url: download_url(api_url, &entry.key),
        }
    }
}

/// Payload of the share-link endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub url: String,
    /// Seconds until the link stops working
    pub expires_in: u64,
}

/// `{api_url}/file/{key}`
pub fn download_url(api_url: &str, key: &str) -> String {
    format!("{}/file/{}", api_url.trim_end_matches('/'), key)
}
