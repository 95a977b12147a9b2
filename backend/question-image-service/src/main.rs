/// Question Image Service - HTTP Server
///
/// Receives question images, compresses oversized ones and stores them in S3.
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use question_image_service::handlers;
use question_image_service::middleware::MetricsMiddleware;
use question_image_service::services::{S3Storage, UploadService};
use question_image_service::Config;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments inject the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Credentials are checked here so a misconfigured pod never binds
    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address();

    tracing::info!(
        env = %config.app.env,
        bucket = %config.s3.bucket,
        strategy = ?config.upload.strategy,
        "Question image service starting on {}",
        bind_address
    );

    let storage = Arc::new(S3Storage::from_config(&config.s3).await);
    let upload_service = web::Data::new(UploadService::new(storage, config.upload.clone()));

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(upload_service.clone())
            .wrap(MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    tracing::info!("Question image service shutting down");
    Ok(())
}
