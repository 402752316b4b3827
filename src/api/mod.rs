//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;

#[cfg(test)]
pub(crate) mod test_support;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/objects")
                    .route("/presign", web::get().to(handlers::objects::presign_object))
                    .route("/size", web::get().to(handlers::objects::object_size))
            )
            .service(
                web::scope("/images")
                    .route("/{image_name}", web::post().to(handlers::images::upload_image))
            )
    )
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::openapi())
    );
}
