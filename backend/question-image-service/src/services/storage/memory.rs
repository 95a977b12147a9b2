/// In-process storage backend
///
/// Keeps every write in memory. Used by the test suites.
use super::{ObjectStorage, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    bucket: String,
    objects: Mutex<Vec<StoredObject>>,
    fail_writes: AtomicBool,
}

impl InMemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Make every following `put_object` call fail with a backend error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every successful write, in call order
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("simulated backend failure".to_string()));
        }

        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(StoredObject {
                key: key.to_string(),
                body,
                content_type: content_type.to_string(),
            });

        Ok(())
    }
}
