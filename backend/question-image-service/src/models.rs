/// Request and response payloads for the upload API
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Query string of `POST /upload/`
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Namespace segment for the stored key; lowercased before use
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
}

impl UploadResponse {
    pub fn success(url: String) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Multipart form accepted by the upload route (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
