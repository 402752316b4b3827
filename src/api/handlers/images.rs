//! Image upload endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, error};
use utoipa::ToSchema;

use super::error::{storage_error, ErrorResponse};
use crate::AppState;

/// Response for a successful upload
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    /// endpoint + bucket + key of the stored object
    pub url: String,
    pub key: String,
    /// Size of the stored JPEG in bytes
    pub size: u64,
    pub upload_time_ms: u64,
}

/// POST /api/v1/images/{image_name} - Upload an image
///
/// The raw request body is decoded, re-encoded as JPEG and stored under the
/// upload prefix with server-side encryption.
#[utoipa::path(
    post,
    path = "/api/v1/images/{image_name}",
    tag = "images",
    params(
        ("image_name" = String, Path, description = "File name of the stored object (e.g., 'user-42.jpg')")
    ),
    request_body(content = String, content_type = "application/octet-stream", description = "Image bytes in any common format"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Invalid image name or undecodable image", body = ErrorResponse),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    let start = Instant::now();
    let image_name = path.into_inner();

    info!(image_name = %image_name, size = body.len(), "Processing image upload");

    if body.is_empty() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("EMPTY_BODY", "Request body must contain an image"));
    }

    match state.storage.upload_image(body, &image_name).await {
        Ok(uploaded) => {
            let elapsed = start.elapsed().as_millis() as u64;

            info!(
                key = %uploaded.key,
                size = uploaded.size,
                upload_time_ms = elapsed,
                "Image uploaded successfully"
            );

            HttpResponse::Ok().json(UploadResponse {
                success: true,
                url: uploaded.url.to_string(),
                key: uploaded.key,
                size: uploaded.size,
                upload_time_ms: elapsed,
            })
        }
        Err(e) => {
            error!(error = %e, image_name = %image_name, "Image upload failed");
            storage_error(&e)
        }
    }
}
