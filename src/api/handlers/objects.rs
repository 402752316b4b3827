//! Endpoints for existing objects: presigned downloads and size lookups

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, error};
use utoipa::ToSchema;

use super::error::{not_s3_url, storage_error, ErrorResponse};
use crate::AppState;

/// Query string carrying the full object URL
#[derive(Debug, Deserialize)]
pub struct ObjectUrlQuery {
    pub url: String,
}

/// Response for a presigned download URL
#[derive(Serialize, ToSchema)]
pub struct PresignResponse {
    pub success: bool,
    /// Signed GET URL
    pub url: String,
    /// Instant after which the signed URL is rejected
    pub expires_at: DateTime<Utc>,
}

/// Response for an object size lookup
#[derive(Serialize, ToSchema)]
pub struct FileSizeResponse {
    pub success: bool,
    /// Content length in bytes
    pub content_length: u64,
}

/// GET /api/v1/objects/presign - Sign a time-limited download URL
#[utoipa::path(
    get,
    path = "/api/v1/objects/presign",
    tag = "objects",
    params(
        ("url" = String, Query, description = "Full object URL, path-style or virtual-hosted")
    ),
    responses(
        (status = 200, description = "Signed download URL", body = PresignResponse),
        (status = 400, description = "URL is not an object URL of this bucket", body = ErrorResponse),
        (status = 500, description = "Signing failed", body = ErrorResponse)
    )
)]
pub async fn presign_object(
    state: web::Data<AppState>,
    query: web::Query<ObjectUrlQuery>,
) -> HttpResponse {
    if !state.storage.is_s3_url(&query.url) {
        return not_s3_url(&query.url);
    }

    match state.storage.presigned_url(&query.url).await {
        Ok(presigned) => {
            info!(expires_at = %presigned.expires_at, "Presigned download URL");
            HttpResponse::Ok().json(PresignResponse {
                success: true,
                url: presigned.url,
                expires_at: presigned.expires_at,
            })
        }
        Err(e) => {
            error!(error = %e, url = %query.url, "Presign failed");
            storage_error(&e)
        }
    }
}

/// GET /api/v1/objects/size - Content length from object metadata
#[utoipa::path(
    get,
    path = "/api/v1/objects/size",
    tag = "objects",
    params(
        ("url" = String, Query, description = "Full object URL, path-style or virtual-hosted")
    ),
    responses(
        (status = 200, description = "Object size", body = FileSizeResponse),
        (status = 400, description = "URL is not an object URL of this bucket", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse),
        (status = 500, description = "Metadata request failed", body = ErrorResponse)
    )
)]
pub async fn object_size(
    state: web::Data<AppState>,
    query: web::Query<ObjectUrlQuery>,
) -> HttpResponse {
    if !state.storage.is_s3_url(&query.url) {
        return not_s3_url(&query.url);
    }

    match state.storage.file_size(&query.url).await {
        Ok(content_length) => HttpResponse::Ok().json(FileSizeResponse {
            success: true,
            content_length,
        }),
        Err(e) => {
            error!(error = %e, url = %query.url, "Object size lookup failed");
            storage_error(&e)
        }
    }
}
