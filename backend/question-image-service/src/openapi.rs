/// OpenAPI documentation for the question image service
use utoipa::OpenApi;

use crate::handlers;
use crate::models::{ErrorResponse, UploadForm, UploadResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lumi Question Image Service API",
        version = "1.0.0",
        description = "Stores question images in object storage, compressing large uploads to a 200 KiB budget, and returns their public URL.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server"),
    ),
    paths(handlers::upload::upload_image, handlers::health::health),
    components(schemas(UploadResponse, ErrorResponse, UploadForm)),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "uploads", description = "Question image uploads"),
    ),
)]
pub struct ApiDoc;
