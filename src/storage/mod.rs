//! Object storage facade
//!
//! Signs download URLs, uploads images and reads object metadata against an
//! S3 bucket. Everything protocol-level is left to `aws-sdk-s3`.

mod error;
#[cfg(test)]
mod fake_s3;
pub mod locator;
mod s3;
mod traits;

pub use error::{StorageError, StorageResult};
pub use s3::S3Manager;
pub use traits::{ObjectStorage, PresignedUrl, UploadedObject};
