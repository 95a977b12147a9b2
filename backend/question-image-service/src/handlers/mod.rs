/// HTTP handlers for question-image-service
///
/// - Upload: store a question image and return its public URL
/// - Health: liveness/readiness probes
pub mod health;
pub mod upload;

use actix_web::{error::QueryPayloadError, web, HttpRequest, HttpResponse};

use crate::error::AppError;
use crate::metrics;
use crate::openapi::ApiDoc;

pub use upload::upload_image;

/// Register every route of the service.
///
/// Shared by `main` and the integration tests so both see the same app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/health", web::get().to(health::health))
        .route("/health/ready", web::get().to(health::ready))
        .route("/health/live", web::get().to(health::live))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .route(
            "/openapi.json",
            web::get().to(|| async {
                use utoipa::OpenApi;
                HttpResponse::Ok().json(ApiDoc::openapi())
            }),
        )
        .route("/upload/", web::post().to(upload_image))
        .route("/upload", web::post().to(upload_image));
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}
