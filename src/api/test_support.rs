//! In-memory storage and app wiring for handler tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};

use crate::config::{S3Settings, ServerSettings, Settings};
use crate::storage::locator::{upload_key, ObjectLocator};
use crate::storage::{ObjectStorage, PresignedUrl, StorageError, StorageResult, UploadedObject};
use crate::AppState;

pub const OBJECT_URL: &str =
    "https://s3.ap-southeast-1.amazonaws.com/S3BucketName/profile_images/3.png";

/// Stores object sizes by key; uploads keep the payload length as-is
#[derive(Clone)]
pub struct FakeStorage {
    locator: ObjectLocator,
    objects: Arc<Mutex<HashMap<String, u64>>>,
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self::with_settings(&settings())
    }
}

impl FakeStorage {
    fn with_settings(settings: &S3Settings) -> Self {
        FakeStorage {
            locator: ObjectLocator::new(settings).unwrap(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A store whose result URLs can never be assembled
    pub fn without_bucket() -> Self {
        Self::with_settings(&S3Settings::new("ap-southeast-1", ""))
    }

    pub fn with_object(self, key: &str, size: u64) -> Self {
        self.objects.lock().unwrap().insert(key.to_string(), size);
        self
    }

    pub fn size_of(&self, key: &str) -> Option<u64> {
        self.objects.lock().unwrap().get(key).copied()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    fn bucket(&self) -> &str {
        self.locator.bucket()
    }

    fn is_s3_url(&self, url: &str) -> bool {
        self.locator.is_s3_url(url)
    }

    async fn presigned_url(&self, object_url: &str) -> StorageResult<PresignedUrl> {
        let key = self.locator.key_from_url(object_url)?;
        let url = self.locator.object_url(&key)?;
        Ok(PresignedUrl {
            url: format!("{}?X-Amz-Expires=3600&X-Amz-Signature=fake", url),
            expires_at: Utc::now() + Duration::seconds(3600),
        })
    }

    async fn upload_image(&self, image: Bytes, image_name: &str) -> StorageResult<UploadedObject> {
        let key = upload_key("profile_images", image_name)?;
        let size = image.len() as u64;
        self.objects.lock().unwrap().insert(key.clone(), size);

        let url = self.locator.object_url(&key)?;
        Ok(UploadedObject { key, url, size })
    }

    async fn file_size(&self, object_url: &str) -> StorageResult<u64> {
        let key = self.locator.key_from_url(object_url)?;
        self.size_of(&key).ok_or(StorageError::NotFound(key))
    }
}

pub fn settings() -> S3Settings {
    S3Settings::new("ap-southeast-1", "S3BucketName")
}

/// The service's routes over `storage`
pub fn test_app<S>(
    storage: S,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    S: ObjectStorage + 'static,
{
    let state = web::Data::new(AppState {
        settings: Settings {
            server: ServerSettings::default(),
            s3: settings(),
        },
        storage: Arc::new(storage),
        started_at: Instant::now(),
    });

    App::new()
        .app_data(state)
        .configure(crate::api::configure_routes)
}
