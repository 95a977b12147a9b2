/// Object storage backends
///
/// The uploader only needs a single write operation plus the public URL
/// convention of the backend, so that is all the trait exposes.
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod memory;
pub mod s3;

pub use memory::InMemoryStorage;
pub use s3::S3Storage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("S3 auth failed (403): check AWS credentials")]
    AccessDenied,

    #[error("S3 bucket not found: {0}")]
    NoSuchBucket(String),

    #[error("S3 upload failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Bucket every object is written to
    fn bucket(&self) -> &str;

    /// Store `body` at `key`. A returned `Ok` means the object is durable.
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Public retrieval URL for `key`; not checked for reachability
    fn public_url(&self, key: &str) -> String {
        public_object_url(self.bucket(), key)
    }
}

/// Virtual-hosted-style S3 URL: `https://<bucket>.s3.amazonaws.com/<key>`
pub fn public_object_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Path-style URL for S3-compatible stores: `<endpoint>/<bucket>/<key>`
pub fn path_style_object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
}
