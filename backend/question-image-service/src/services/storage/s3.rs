/// S3 storage backend for question images
///
/// Builds an AWS S3 client from explicit credentials and writes objects with
/// a single PutObject call. No retries are layered on top of the SDK defaults.
use super::{path_style_object_url, ObjectStorage, StorageError};
use crate::config::S3Config;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            endpoint: None,
        }
    }

    /// Serve public URLs path-style from `endpoint` instead of the AWS host
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Initialize the S3 client from configuration
    ///
    /// Credentials are taken from `config` rather than the default provider
    /// chain. A custom endpoint (MinIO and friends) switches to path-style
    /// addressing for both requests and public URLs.
    pub async fn from_config(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "question_image_service",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            custom_endpoint = config.endpoint.is_some(),
            "S3 storage client initialized"
        );

        let storage = Self::new(Client::from_conf(s3_config), config.bucket.clone());
        match &config.endpoint {
            Some(endpoint) => storage.with_endpoint(endpoint.clone()),
            None => storage,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(key, error = ?e, "PutObject failed");
                put_error(&self.bucket, &e)
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => path_style_object_url(endpoint, &self.bucket, key),
            None => super::public_object_url(&self.bucket, key),
        }
    }
}

fn put_error(bucket: &str, err: &SdkError<PutObjectError>) -> StorageError {
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify_error(bucket, err.code(), status, DisplayErrorContext(err).to_string())
}

fn classify_error(
    bucket: &str,
    code: Option<&str>,
    status: Option<u16>,
    message: String,
) -> StorageError {
    match (code, status) {
        (Some("AccessDenied") | Some("InvalidAccessKeyId") | Some("SignatureDoesNotMatch"), _)
        | (_, Some(403)) => StorageError::AccessDenied,
        (Some("NoSuchBucket"), _) => StorageError::NoSuchBucket(bucket.to_string()),
        _ => StorageError::Backend(message),
    }
}
