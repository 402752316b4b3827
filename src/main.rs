//! S3 Image Service
//!
//! Storage facade over Amazon S3 using Rust + Actix-Web.
//! Signs time-limited download URLs, uploads images with server-side
//! encryption and reads object sizes from metadata.

use actix_web::{web, App, HttpServer, middleware};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_actix_web::TracingLogger;

mod api;
mod config;
mod imaging;
mod storage;

use crate::config::Settings;
use crate::storage::{ObjectStorage, S3Manager};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub storage: Arc<dyn ObjectStorage>,
    pub started_at: Instant,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("s3_image_service=info".parse()?)
                .add_directive("actix_web=info".parse()?)
        )
        .json()
        .init();

    let settings = Settings::load().context("Failed to load configuration")?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting S3 Image Service v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    let storage = S3Manager::new(&settings.s3)
        .await
        .context("Failed to initialize S3 client")?;

    info!(
        bucket = %settings.s3.bucket_name,
        region = %settings.s3.region,
        static_credentials = settings.s3.has_static_credentials(),
        "S3 client initialized"
    );

    let max_upload_bytes = settings.server.max_upload_bytes;
    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    let app_state = web::Data::new(AppState {
        settings,
        storage: Arc::new(storage),
        started_at: Instant::now(),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "s3-image-service"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
