//! # Storage API Store
//!
//! Object storage layer for the storage API gateway.
//!
//! This crate provides:
//! - **Object operations**: List, get, head, put and delete objects by key
//! - **Presigning**: Time-limited download URLs
//! - **Backends**: Any S3-compatible bucket (Cloudflare R2 by default) and
//!   an in-memory store for development and tests
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Gateway Handlers            │
//! ├─────────────────────────────────────────┤
//! │            ObjectStore Trait            │
//! ├────────────────────┬────────────────────┤
//! │   S3ObjectStore    │ MemoryObjectStore  │
//! ├────────────────────┴────────────────────┤
//! │        S3 / R2 / MinIO bucket           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use storage_api_store::{MemoryObjectStore, ObjectStore, PutMode};
//!
//! let store = MemoryObjectStore::new("files");
//! store.put_object("docs/a.txt", data, "text/plain", PutMode::Create).await?;
//! let entries = store.list_objects("docs").await?;
//! ```

pub mod error;
pub mod memory;
pub mod s3;

pub use error::{Result, StoreError};
pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::time::Duration;

/// Lifetime of every presigned URL handed out by the gateway (1 hour)
pub const PRESIGN_TTL: Duration = Duration::from_secs(60 * 60);

/// Content type used when an object carries none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A single entry of a prefix listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time reported by the store
    pub last_modified: DateTime<Utc>,
}

/// Object metadata without the body
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
}

/// Streamed object body
pub type ByteChunkStream = BoxStream<'static, Result<Bytes>>;

/// A fetched object
pub struct ObjectBody {
    /// Content type recorded at upload time
    pub content_type: Option<String>,
    /// Body length, when the store reports it
    pub size: Option<u64>,
    /// Body chunks
    pub stream: ByteChunkStream,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Write behaviour for [`ObjectStore::put_object`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutMode {
    /// Replace whatever is stored under the key
    Overwrite,
    /// Only write if the key does not exist yet (`If-None-Match: *`)
    Create,
}

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object whose key starts with `prefix`
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>>;

    /// Fetch an object with its body
    async fn get_object(&self, key: &str) -> Result<ObjectBody>;

    /// Fetch object metadata only
    async fn head_object(&self, key: &str) -> Result<ObjectMeta>;

    /// Store an object
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        mode: PutMode,
    ) -> Result<()>;

    /// Delete an object
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Generate a credential-free GET URL valid for `ttl`
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// Collect a streamed body into memory.
///
/// Only meant for small objects and tests.
pub async fn read_body(body: ObjectBody) -> Result<Bytes> {
    use futures::TryStreamExt;

    let chunks: Vec<Bytes> = body.stream.try_collect().await?;
    Ok(Bytes::from(chunks.concat()))
}
