/// Business logic layer for question-image-service
///
/// - `compressor`: size-bounded PNG re-encoding
/// - `storage`: object storage backends (S3, in-memory)
/// - `uploader`: key derivation, compression decision, write and URL building
pub mod compressor;
pub mod storage;
pub mod uploader;

pub use compressor::{CompressionError, CompressionOutcome, CompressionStrategy, Compressor};
pub use storage::{InMemoryStorage, ObjectStorage, S3Storage, StorageError};
pub use uploader::{UploadError, UploadService, UploadedImage};
