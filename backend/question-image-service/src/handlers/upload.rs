/// Upload handler - HTTP endpoint for question images
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::error::{AppError, Result};
use crate::models::{ErrorResponse, UploadForm, UploadQuery, UploadResponse};
use crate::services::UploadService;

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Upload a question image
///
/// Reads the `file` field, compresses it when it is over the size threshold,
/// stores it under `questions/<subject>/` and returns the public URL.
#[utoipa::path(
    post,
    path = "/upload/",
    tag = "uploads",
    params(UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Malformed request or undecodable image", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse),
    )
)]
pub async fn upload_image(
    service: web::Data<UploadService>,
    query: web::Query<UploadQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let limit = service.config().max_request_bytes;
    let mut file: Option<Bytes> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        if field.name() == Some(FILE_FIELD) && file.is_none() {
            file = Some(read_field(&mut field, limit).await?);
        } else {
            // Drain fields we do not use so the stream can advance
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
            }
        }
    }

    let file = file.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    tracing::debug!(subject = %query.subject, size = file.len(), "Received question image");

    let uploaded = service.upload(&query.subject, file).await?;

    Ok(HttpResponse::Ok().json(UploadResponse::success(uploaded.url)))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Bytes> {
    let mut data = BytesMut::new();

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("File read error: {}", e)))?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::BadRequest(format!(
                "File exceeds maximum upload size of {} bytes",
                limit
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data.freeze())
}
