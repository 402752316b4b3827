//! Error payloads shared by the storage endpoints

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::StorageError;

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ApiError,
}

#[derive(Serialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: ApiError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// 400 for a URL that does not point into the configured bucket's provider
pub fn not_s3_url(url: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(
        "NOT_S3_URL",
        format!("'{}' is not an object URL of this storage provider", url),
    ))
}

/// Map a storage failure to its HTTP response
pub fn storage_error(err: &StorageError) -> HttpResponse {
    let message = err.to_string();
    match err {
        StorageError::InvalidUrl(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("INVALID_URL", message))
        }
        StorageError::InvalidImageName(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("INVALID_IMAGE_NAME", message))
        }
        StorageError::Image(_) => {
            HttpResponse::BadRequest().json(ErrorResponse::new("INVALID_IMAGE", message))
        }
        StorageError::NotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse::new("OBJECT_NOT_FOUND", message))
        }
        StorageError::Presign(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("PRESIGN_FAILED", message))
        }
        StorageError::Upload(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("UPLOAD_FAILED", message))
        }
        StorageError::ResultUrl(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new("UPLOAD_RESULT_URL_NOT_READY", message)),
        StorageError::Metadata(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("METADATA_FAILED", message))
        }
        StorageError::MissingContentLength(_) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new("MISSING_CONTENT_LENGTH", message)),
        StorageError::InvalidConfig(_) | StorageError::Internal(_) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new("INTERNAL_ERROR", message))
        }
    }
}
