//! Storage facade contract
//!
//! The rest of the application only sees `ObjectStorage`. `S3Manager` is the
//! SDK-backed implementation; tests substitute an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::error::StorageResult;

/// A signed, time-limited download URL
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// An image stored by `upload_image`
#[derive(Debug, Clone)]
pub struct UploadedObject {
    /// Object key inside the bucket
    pub key: String,
    /// endpoint + bucket + key
    pub url: Url,
    /// Size of the stored (re-encoded) payload
    pub size: u64,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Bucket every operation targets
    fn bucket(&self) -> &str;

    /// Whether `url` points into the configured storage provider
    fn is_s3_url(&self, url: &str) -> bool;

    /// Sign a read-only GET URL for the object behind `object_url`
    async fn presigned_url(&self, object_url: &str) -> StorageResult<PresignedUrl>;

    /// Re-encode `image` as JPEG and store it under the upload prefix
    async fn upload_image(&self, image: Bytes, image_name: &str) -> StorageResult<UploadedObject>;

    /// Content length of the object behind `object_url`, from its metadata only
    async fn file_size(&self, object_url: &str) -> StorageResult<u64>;
}
