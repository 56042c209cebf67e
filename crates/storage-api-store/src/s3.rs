//! S3-compatible object store (Cloudflare R2, AWS S3, MinIO)

use crate::{
    ObjectBody, ObjectEntry, ObjectMeta, ObjectStore, PutMode, Result, StoreError,
};
use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::instrument;

/// Connection settings for an S3-compatible bucket
#[derive(Clone)]
pub struct S3Config {
    /// Cloudflare account id, used to derive the R2 endpoint
    pub account_id: String,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket: String,
    /// Bucket region (`auto` for R2)
    pub region: String,
    /// Explicit endpoint, overrides the R2 endpoint
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Endpoint the client talks to
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.r2.cloudflarestorage.com", self.account_id),
        }
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Object store backed by the AWS SDK
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from static credentials
    pub fn new(config: &S3Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(StoreError::Configuration("bucket name is empty".to_string()));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "storage-api",
        );

        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
        })
    }

    /// Bucket this store reads and writes
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// How an SDK failure is surfaced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Failure {
    Missing,
    Taken,
    Other,
}

/// Classify by error code and HTTP status.
///
/// Providers disagree on how a missing key is reported (`NoSuchKey`,
/// `NotFound`, or a bare 404 on HEAD), so all of them count as missing.
fn classify(code: Option<&str>, status: Option<u16>) -> Failure {
    match (code, status) {
        (Some("NoSuchKey" | "NotFound"), _) | (_, Some(404)) => Failure::Missing,
        (Some("PreconditionFailed"), _) | (_, Some(412)) => Failure::Taken,
        _ => Failure::Other,
    }
}

/// Translate an SDK failure for `key` into a store error
fn map_sdk_error<E>(key: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|response| response.status().as_u16());

    match classify(err.code(), status) {
        Failure::Missing => StoreError::NotFound(key.to_string()),
        Failure::Taken => StoreError::AlreadyExists(key.to_string()),
        Failure::Other => {
            let message = DisplayErrorContext(&err).to_string();
            tracing::debug!(key = %key, error = %message, "S3 request failed");
            StoreError::Unavailable(message)
        }
    }
}

fn to_chrono(value: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    value
        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or_default()
}

fn to_size(value: Option<i64>) -> Option<u64> {
    value.and_then(|len| u64::try_from(len).ok())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut entries = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                StoreError::Unavailable(DisplayErrorContext(&e).to_string())
            })?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                entries.push(ObjectEntry {
                    key: key.to_string(),
                    size: to_size(object.size()).unwrap_or(0),
                    last_modified: to_chrono(object.last_modified()),
                });
            }
        }

        tracing::debug!(count = entries.len(), "Listed objects");
        Ok(entries)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(key, e))?;

        let content_type = output.content_type().map(str::to_string);
        let size = to_size(output.content_length());

        let stream = futures::stream::unfold(output.body, |mut body| async move {
            body.next().await.map(|chunk| {
                let chunk = chunk.map_err(|e| StoreError::Unavailable(e.to_string()));
                (chunk, body)
            })
        });

        Ok(ObjectBody {
            content_type,
            size,
            stream: Box::pin(stream),
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn head_object(&self, key: &str) -> Result<ObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(key, e))?;

        Ok(ObjectMeta {
            key: key.to_string(),
            size: to_size(output.content_length()).unwrap_or(0),
            last_modified: to_chrono(output.last_modified()),
            content_type: output.content_type().map(str::to_string),
        })
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        mode: PutMode,
    ) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data));

        if mode == PutMode::Create {
            request = request.if_none_match("*");
        }

        request.send().await.map_err(|e| map_sdk_error(key, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(key, e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StoreError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(endpoint: Option<&str>) -> S3Config {
        S3Config {
            account_id: "abc123".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "files".to_string(),
            region: "auto".to_string(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[rstest]
    #[case(Some("NoSuchKey"), Some(404), Failure::Missing)]
    #[case(Some("NotFound"), None, Failure::Missing)]
    #[case(None, Some(404), Failure::Missing)]
    #[case(Some("PreconditionFailed"), Some(412), Failure::Taken)]
    #[case(None, Some(412), Failure::Taken)]
    #[case(Some("AccessDenied"), Some(403), Failure::Other)]
    #[case(Some("InternalError"), Some(500), Failure::Other)]
    #[case(None, None, Failure::Other)]
    fn test_classify(
        #[case] code: Option<&str>,
        #[case] status: Option<u16>,
        #[case] expected: Failure,
    ) {
        assert_eq!(classify(code, status), expected);
    }

    #[test]
    fn test_r2_endpoint_from_account_id() {
        assert_eq!(
            config(None).endpoint_url(),
            "https://abc123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_endpoint_override() {
        assert_eq!(
            config(Some("http://localhost:9000/")).endpoint_url(),
            "http://localhost:9000"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config(None));
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_empty_bucket_is_rejected() {
        let mut cfg = config(None);
        cfg.bucket.clear();
        assert!(matches!(
            S3ObjectStore::new(&cfg),
            Err(StoreError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_presign_is_local() {
        let store = S3ObjectStore::new(&config(Some("http://localhost:9000"))).unwrap();
        let url = store
            .presign("docs/readme.txt", crate::PRESIGN_TTL)
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/files/docs/readme.txt?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }
}
