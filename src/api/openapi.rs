//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    error::{ApiError, ErrorResponse},
    health::HealthResponse,
    images::UploadResponse,
    objects::{FileSizeResponse, PresignResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "S3 Image Service API",
        version = "1.0.0",
        description = "Presigned downloads, encrypted image uploads and object metadata over S3",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "objects", description = "Signed downloads and metadata for stored objects"),
        (name = "images", description = "Image upload endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::objects::presign_object,
        crate::api::handlers::objects::object_size,
        crate::api::handlers::images::upload_image,
    ),
    components(
        schemas(
            HealthResponse,
            PresignResponse,
            FileSizeResponse,
            UploadResponse,
            ErrorResponse,
            ApiError,
        )
    )
)]
pub struct ApiDoc;
