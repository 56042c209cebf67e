//! In-memory object store for development and testing

use crate::{
    ObjectBody, ObjectEntry, ObjectMeta, ObjectStore, PutMode, Result, StoreError,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

/// An in-memory object store
#[derive(Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<DashMap<String, StoredObject>>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryObjectStore {
    /// Create a new empty store; `bucket` only shows up in presigned URLs
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(DashMap::new()),
        }
    }

    /// Seed an object directly, bypassing write modes
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>, content_type: Option<&str>) {
        self.objects.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: content_type.map(str::to_string),
                last_modified: Utc::now(),
            },
        );
    }

    /// Raw bytes stored under a key
    pub fn get_bytes(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|entry| entry.data.clone())
    }

    /// Content type stored under a key
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).and_then(|entry| entry.content_type.clone())
    }

    /// Check whether a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Get the number of objects stored
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let mut entries: Vec<ObjectEntry> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| ObjectEntry {
                key: entry.key().clone(),
                size: entry.value().data.len() as u64,
                last_modified: entry.value().last_modified,
            })
            .collect();

        // S3 lists keys in lexicographic order
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn get_object(&self, key: &str) -> Result<ObjectBody> {
        let object = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let size = object.data.len() as u64;
        let chunk: Result<Bytes> = Ok(object.data);

        Ok(ObjectBody {
            content_type: object.content_type,
            size: Some(size),
            stream: Box::pin(futures::stream::once(async move { chunk })),
        })
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMeta> {
        self.objects
            .get(key)
            .map(|entry| ObjectMeta {
                key: key.to_string(),
                size: entry.data.len() as u64,
                last_modified: entry.last_modified,
                content_type: entry.content_type.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        mode: PutMode,
    ) -> Result<()> {
        let object = StoredObject {
            data,
            content_type: Some(content_type.to_string()),
            last_modified: Utc::now(),
        };

        match (self.objects.entry(key.to_string()), mode) {
            (Entry::Occupied(_), PutMode::Create) => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            (Entry::Occupied(mut occupied), PutMode::Overwrite) => {
                occupied.insert(object);
                Ok(())
            }
            (Entry::Vacant(vacant), _) => {
                vacant.insert(object);
                Ok(())
            }
        }
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        let expires = (Utc::now() + ttl).timestamp();
        Ok(format!("memory://{}/{}?expires={}", self.bucket, key, expires))
    }
}
