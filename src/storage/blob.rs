use super::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One stored object as returned by a listing: its name, the caller-supplied
/// metadata map, and the store's own last-modified instant.
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub name: String,
    pub metadata: HashMap<String, String>,
    pub last_modified: DateTime<Utc>,
}

/// Content store holding originals and thumbnails, one flat namespace per
/// container. Consumed read/write but never enumerated outside listings.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<(), StorageError>;

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Fails `NotFound` when the object does not exist.
    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError>;

    async fn list_with_metadata(&self, container: &str) -> Result<Vec<BlobEntry>, StorageError>;
}
