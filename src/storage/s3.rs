//! S3 storage client
//!
//! Wraps `aws-sdk-s3` with the bucket layout used by the service:
//! ```text
//! {bucket}/
//! └── profile_images/        # upload_prefix, configurable
//!     └── {image_name}       # always JPEG, SSE aws:kms
//! ```

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_s3::{
    Client as S3Client,
    config::{BehaviorVersion, Builder, Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart, ServerSideEncryption},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::error::sdk_message;
use super::locator::{upload_key, ObjectLocator};
use super::{ObjectStorage, PresignedUrl, StorageError, StorageResult, UploadedObject};
use crate::config::S3Settings;
use crate::imaging::{self, JPEG_CONTENT_TYPE};

/// S3-backed implementation of [`ObjectStorage`]
#[derive(Clone)]
pub struct S3Manager {
    client: S3Client,
    locator: ObjectLocator,
    settings: S3Settings,
}

impl S3Manager {
    /// Create a new client from settings
    ///
    /// Static credentials are used when configured; otherwise the default AWS
    /// credential chain (env, profile, IMDS) is resolved.
    pub async fn new(settings: &S3Settings) -> StorageResult<Self> {
        settings
            .validate()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        let locator = ObjectLocator::new(settings)?;
        let region = Region::new(settings.region.clone());

        let mut builder = if settings.has_static_credentials() {
            let credentials = Credentials::new(
                &settings.access_key,
                &settings.secret_key,
                None, // session token
                None, // expiry
                "s3-image-service-static",
            );
            Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
        } else {
            debug!("No static credentials configured, using the default credential chain");
            let shared = aws_config::defaults(BehaviorVersion::latest())
                .region(region)
                .load()
                .await;
            Builder::from(&shared)
        };

        if locator.is_custom_endpoint() {
            debug!(endpoint = %locator.endpoint(), "Using custom S3 endpoint");
            builder = builder
                .endpoint_url(locator.endpoint().as_str().trim_end_matches('/'))
                .force_path_style(true);
        }

        Ok(Self {
            client: S3Client::from_conf(builder.build()),
            locator,
            settings: settings.clone(),
        })
    }

    fn presigning_config(&self, start: SystemTime) -> StorageResult<PresigningConfig> {
        PresigningConfig::builder()
            .start_time(start)
            .expires_in(Duration::from_secs(self.settings.presign_expiry_secs))
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    fn server_side_encryption(&self) -> ServerSideEncryption {
        ServerSideEncryption::from(self.settings.server_side_encryption.as_str())
    }

    /// Store `data` with a single PutObject
    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(self.locator.bucket())
            .key(key)
            .body(ByteStream::from(data))
            .content_type(JPEG_CONTENT_TYPE)
            .content_length(size as i64)
            .server_side_encryption(self.server_side_encryption())
            .set_ssekms_key_id(self.settings.sse_kms_key_id.clone())
            .send()
            .await
            .map_err(|e| StorageError::Upload(sdk_message(&e)))?;

        Ok(())
    }

    /// Store `data` as a multipart upload, aborting it if any step fails
    async fn put_multipart(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let created = self.client
            .create_multipart_upload()
            .bucket(self.locator.bucket())
            .key(key)
            .content_type(JPEG_CONTENT_TYPE)
            .server_side_encryption(self.server_side_encryption())
            .set_ssekms_key_id(self.settings.sse_kms_key_id.clone())
            .send()
            .await
            .map_err(|e| StorageError::Upload(sdk_message(&e)))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::Upload("missing multipart upload id".to_string()))?
            .to_string();

        match self.upload_parts(key, &upload_id, data).await {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(self.locator.bucket())
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|e| StorageError::Upload(sdk_message(&e)))?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = self.client
                    .abort_multipart_upload()
                    .bucket(self.locator.bucket())
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        key,
                        upload_id = %upload_id,
                        error = %sdk_message(&abort_err),
                        "Failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        data: Vec<u8>,
    ) -> StorageResult<Vec<CompletedPart>> {
        let data = Bytes::from(data);
        let mut parts = Vec::new();

        for (index, chunk) in data.chunks(self.settings.multipart_part_size_bytes).enumerate() {
            let part_number = index as i32 + 1;

            let uploaded = self.client
                .upload_part()
                .bucket(self.locator.bucket())
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(data.slice_ref(chunk)))
                .send()
                .await
                .map_err(|e| StorageError::Upload(sdk_message(&e)))?;

            debug!(key, part_number, bytes = chunk.len(), "Uploaded part");

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(uploaded.e_tag().map(String::from))
                    .part_number(part_number)
                    .build(),
            );
        }

        Ok(parts)
    }
}

#[async_trait]
impl ObjectStorage for S3Manager {
    fn bucket(&self) -> &str {
        self.locator.bucket()
    }

    fn is_s3_url(&self, url: &str) -> bool {
        self.locator.is_s3_url(url)
    }

    #[instrument(skip(self))]
    async fn presigned_url(&self, object_url: &str) -> StorageResult<PresignedUrl> {
        let key = self.locator.key_from_url(object_url)?;

        let start = SystemTime::now();
        let config = self.presigning_config(start)?;
        let expires_at: DateTime<Utc> =
            (start + Duration::from_secs(self.settings.presign_expiry_secs)).into();

        let request = self.client
            .get_object()
            .bucket(self.locator.bucket())
            .key(&key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::Presign(sdk_message(&e)))?;

        debug!(key = %key, expires_at = %expires_at, "Presigned GET URL");

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            expires_at,
        })
    }

    #[instrument(skip(self, image), fields(size = image.len()))]
    async fn upload_image(&self, image: Bytes, image_name: &str) -> StorageResult<UploadedObject> {
        let key = upload_key(&self.settings.upload_prefix, image_name)?;

        let quality = self.settings.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || imaging::encode_jpeg(&image, quality))
            .await
            .map_err(|e| StorageError::Internal(format!("Encode task join error: {}", e)))??;

        let size = jpeg.len() as u64;
        if jpeg.len() >= self.settings.multipart_threshold_bytes {
            debug!(key = %key, size, "Uploading as multipart");
            self.put_multipart(&key, jpeg).await?;
        } else {
            self.put(&key, jpeg).await?;
        }

        let url = self.locator.object_url(&key)?;

        info!("Uploaded to S3: {} ({} bytes)", key, size);

        Ok(UploadedObject { key, url, size })
    }

    #[instrument(skip(self))]
    async fn file_size(&self, object_url: &str) -> StorageResult<u64> {
        let key = self.locator.key_from_url(object_url)?;

        let head = self.client
            .head_object()
            .bucket(self.locator.bucket())
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false);
                if not_found {
                    StorageError::NotFound(key.clone())
                } else {
                    StorageError::Metadata(sdk_message(&e))
                }
            })?;

        let length = head
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| StorageError::MissingContentLength(key.clone()))?;

        debug!(key = %key, length, "Fetched object size");

        Ok(length)
    }
}
