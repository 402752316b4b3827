use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid object URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid image name: {0}")]
    InvalidImageName(String),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Presign failed: {0}")]
    Presign(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Metadata request failed: {0}")]
    Metadata(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Content length missing for object: {0}")]
    MissingContentLength(String),

    /// Upload succeeded but the resulting object URL could not be assembled
    #[error("Upload result URL not ready: {0}")]
    ResultUrl(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Render an SDK error with its full source chain
pub(crate) fn sdk_message<E, R>(err: &SdkError<E, R>) -> String
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    DisplayErrorContext(err).to_string()
}
