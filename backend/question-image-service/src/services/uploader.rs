//! Upload service - stores question images and hands back their public URL
//!
//! Workflow per request:
//! 1. Derive a fresh storage key under `questions/<subject>/`
//! 2. Compress the payload when it exceeds the configured threshold
//! 3. Write the bytes to object storage as `image/png`
//! 4. Build the public URL only after the write succeeded

use super::compressor::{CompressionError, CompressionOutcome, Compressor};
use super::storage::{ObjectStorage, StorageError};
use crate::config::UploadConfig;
use crate::metrics;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Top-level namespace for every stored question image
pub const KEY_PREFIX: &str = "questions";

/// Content type recorded on every stored object
pub const CONTENT_TYPE_PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("subject must not be empty")]
    InvalidSubject,

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Errors caused by the request itself rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidSubject | UploadError::Compression(CompressionError::Decode(_))
        )
    }

    fn outcome_label(&self) -> &'static str {
        match self {
            UploadError::InvalidSubject => "invalid_subject",
            UploadError::Compression(CompressionError::Decode(_)) => "decode_error",
            UploadError::Compression(_) => "compression_error",
            UploadError::Storage(_) => "storage_error",
        }
    }
}

/// Outcome of a successful upload
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub key: String,
    pub url: String,
    /// Bytes actually written to storage
    pub stored_size: usize,
    /// Present when the payload went through the compressor
    pub compression: Option<CompressionOutcome>,
}

/// Build the storage key for a subject: `questions/<lowercase subject>/<id>.png`
pub fn storage_key(subject: &str, id: Uuid) -> String {
    format!("{}/{}/{}.png", KEY_PREFIX, subject.to_lowercase(), id)
}

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    compressor: Arc<Compressor>,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: UploadConfig) -> Self {
        let compressor = Arc::new(Compressor::new(config.strategy));
        Self {
            storage,
            compressor,
            config,
        }
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Store an image for `subject` and return where it can be fetched
    pub async fn upload(&self, subject: &str, payload: Bytes) -> Result<UploadedImage, UploadError> {
        let result = self.store(subject, payload).await;

        match &result {
            Ok(uploaded) => {
                metrics::record_upload("success");
                info!(
                    key = %uploaded.key,
                    bucket = %self.bucket(),
                    size = uploaded.stored_size,
                    compressed = uploaded.compression.is_some(),
                    "Question image uploaded"
                );
            }
            Err(err) => {
                metrics::record_upload(err.outcome_label());
                warn!(subject, error = %err, "Question image upload failed");
            }
        }

        result
    }

    async fn store(&self, subject: &str, payload: Bytes) -> Result<UploadedImage, UploadError> {
        if subject.trim().is_empty() {
            return Err(UploadError::InvalidSubject);
        }

        let key = storage_key(subject, Uuid::new_v4());

        let (body, compression) = if payload.len() > self.config.compression_threshold_bytes {
            debug!(
                %key,
                size = payload.len(),
                threshold = self.config.compression_threshold_bytes,
                "Payload over threshold, compressing"
            );
            let outcome = self
                .compressor
                .clone()
                .compress_async(payload, self.config.max_size_bytes)
                .await?;
            metrics::observe_compression(&outcome);

            if outcome.size() > self.config.max_size_bytes {
                warn!(
                    %key,
                    size = outcome.size(),
                    ceiling = self.config.max_size_bytes,
                    "Compression floor reached above ceiling"
                );
            }
            (outcome.data.clone(), Some(outcome))
        } else {
            (payload, None)
        };

        let stored_size = body.len();
        self.storage.put_object(&key, body, CONTENT_TYPE_PNG).await?;

        let url = self.storage.public_url(&key);

        Ok(UploadedImage {
            key,
            url,
            stored_size,
            compression,
        })
    }
}
