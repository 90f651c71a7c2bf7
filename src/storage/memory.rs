use super::{BlobEntry, BlobStore, EntityTable, StorageError, TableRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory blob store. Backs tests and throwaway local runs; nothing is
/// persisted across restarts.
#[derive(Default)]
pub struct MemoryBlobStore {
    containers: RwLock<HashMap<String, HashMap<String, StoredBlob>>>,
}

struct StoredBlob {
    bytes: Vec<u8>,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the store-assigned modification instant of an object. Lets
    /// tests exercise the effective-time fallback deterministically.
    pub async fn set_last_modified(&self, container: &str, name: &str, instant: DateTime<Utc>) {
        let mut containers = self.containers.write().await;
        if let Some(blob) = containers
            .get_mut(container)
            .and_then(|objects| objects.get_mut(name))
        {
            blob.last_modified = instant;
        }
    }

    fn missing(container: &str, name: &str) -> StorageError {
        StorageError::NotFound(format!("{}/{}", container, name))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        containers.entry(container.to_string()).or_default().insert(
            name.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                metadata: metadata.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let containers = self.containers.read().await;
        containers
            .get(container)
            .and_then(|objects| objects.get(name))
            .map(|blob| blob.bytes.clone())
            .ok_or_else(|| Self::missing(container, name))
    }

    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        containers
            .get_mut(container)
            .and_then(|objects| objects.remove(name))
            .map(|_| ())
            .ok_or_else(|| Self::missing(container, name))
    }

    async fn list_with_metadata(&self, container: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let containers = self.containers.read().await;
        let mut entries: Vec<BlobEntry> = containers
            .get(container)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(name, blob)| BlobEntry {
                        name: name.clone(),
                        metadata: blob.metadata.clone(),
                        last_modified: blob.last_modified,
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// In-memory partition/row table with the same contract as the persistent
/// backend.
#[derive(Default)]
pub struct MemoryEntityTable {
    rows: RwLock<HashMap<(String, String), TableRow>>,
}

impl MemoryEntityTable {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityTable for MemoryEntityTable {
    async fn insert(&self, row: TableRow) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let key = (row.partition.clone(), row.row.clone());
        if rows.contains_key(&key) {
            return Err(StorageError::AlreadyExists(format!(
                "{}/{}",
                row.partition, row.row
            )));
        }
        rows.insert(key, row);
        Ok(())
    }

    async fn get(&self, partition: &str, row: &str) -> Result<TableRow, StorageError> {
        let rows = self.rows.read().await;
        rows.get(&(partition.to_string(), row.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", partition, row)))
    }

    async fn delete(&self, partition: &str, row: &str) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        rows.remove(&(partition.to_string(), row.to_string()));
        Ok(())
    }

    async fn query_partition(&self, partition: &str) -> Result<Vec<TableRow>, StorageError> {
        let rows = self.rows.read().await;
        let mut matches: Vec<TableRow> = rows
            .values()
            .filter(|row| row.partition == partition)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.row.cmp(&b.row));
        Ok(matches)
    }

    async fn query_all(&self) -> Result<Vec<TableRow>, StorageError> {
        let rows = self.rows.read().await;
        let mut all: Vec<TableRow> = rows.values().cloned().collect();
        all.sort_by(|a, b| (&a.partition, &a.row).cmp(&(&b.partition, &b.row)));
        Ok(all)
    }
}
