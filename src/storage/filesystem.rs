use super::{BlobEntry, BlobStore, EntityTable, StorageError, TableRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

const METADATA_SUFFIX: &str = ".meta.json";

/// Blob store over a local directory tree: one subdirectory per container,
/// one file per object, caller metadata in a JSON sidecar next to it.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, container: &str, name: &str) -> PathBuf {
        self.root.join(container).join(name)
    }

    fn sidecar_path(&self, container: &str, name: &str) -> PathBuf {
        self.root
            .join(container)
            .join(format!("{}{}", name, METADATA_SUFFIX))
    }

    fn missing(container: &str, name: &str) -> StorageError {
        StorageError::NotFound(format!("{}/{}", container, name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
        metadata: &HashMap<String, String>,
    ) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.root.join(container)).await?;
        tokio::fs::write(self.object_path(container, name), bytes).await?;

        let json = serde_json::to_string_pretty(metadata)?;
        tokio::fs::write(self.sidecar_path(container, name), json).await?;

        debug!("stored blob {}/{} ({} bytes)", container, name, bytes.len());
        Ok(())
    }

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        match tokio::fs::read(self.object_path(container, name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Self::missing(container, name)),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.object_path(container, name)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Self::missing(container, name));
            }
            Err(err) => return Err(err.into()),
        }

        // The sidecar may legitimately be absent.
        match tokio::fs::remove_file(self.sidecar_path(container, name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_with_metadata(&self, container: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let dir = self.root.join(container);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(METADATA_SUFFIX) {
                continue;
            }

            let file_metadata = entry.metadata().await?;
            if !file_metadata.is_file() {
                continue;
            }
            let last_modified = file_metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            let metadata = match tokio::fs::read_to_string(self.sidecar_path(container, &name)).await
            {
                Ok(json) => serde_json::from_str(&json)?,
                Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
                Err(err) => return Err(err.into()),
            };

            entries.push(BlobEntry {
                name,
                metadata,
                last_modified,
            });
        }

        Ok(entries)
    }
}

/// Keyed table persisted as one JSON file, rewritten on every mutation. Load
/// happens once at startup; the in-memory map is authoritative afterwards.
pub struct FsEntityTable {
    path: PathBuf,
    rows: RwLock<HashMap<(String, String), TableRow>>,
}

impl FsEntityTable {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let rows = load_rows(&path)?;
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    async fn persist(
        &self,
        rows: &HashMap<(String, String), TableRow>,
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut snapshot: Vec<&TableRow> = rows.values().collect();
        snapshot.sort_by(|a, b| (&a.partition, &a.row).cmp(&(&b.partition, &b.row)));
        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

fn load_rows(path: &Path) -> Result<HashMap<(String, String), TableRow>, StorageError> {
    if !path.exists() {
        debug!("table file {:?} not found, starting empty", path);
        return Ok(HashMap::new());
    }

    let json = std::fs::read_to_string(path)?;
    let rows: Vec<TableRow> = serde_json::from_str(&json)?;
    info!("loaded {} table rows from {:?}", rows.len(), path);

    Ok(rows
        .into_iter()
        .map(|row| ((row.partition.clone(), row.row.clone()), row))
        .collect())
}

#[async_trait]
impl EntityTable for FsEntityTable {
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
        self.persist(&rows).await
    }

    async fn get(&self, partition: &str, row: &str) -> Result<TableRow, StorageError> {
        let rows = self.rows.read().await;
        rows.get(&(partition.to_string(), row.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", partition, row)))
    }

    async fn delete(&self, partition: &str, row: &str) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if rows
            .remove(&(partition.to_string(), row.to_string()))
            .is_some()
        {
            self.persist(&rows).await?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn blob_round_trip_with_metadata() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        let mut metadata = HashMap::new();
        metadata.insert(
            "lastModified".to_string(),
            "2023-01-01T00:00:00+00:00".to_string(),
        );

        store
            .upload("photos", "beach.jpg", b"pixels", &metadata)
            .await
            .unwrap();

        let bytes = store.download("photos", "beach.jpg").await.unwrap();
        assert_eq!(bytes, b"pixels");

        let listing = store.list_with_metadata("photos").await.unwrap();
        assert_eq!(listing.len(), 1, "sidecar files must not be listed");
        assert_eq!(listing[0].name, "beach.jpg");
        assert_eq!(
            listing[0].metadata.get("lastModified").map(String::as_str),
            Some("2023-01-01T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn download_and_delete_missing_blob_fail_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        assert!(matches!(
            store.download("photos", "nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("photos", "nope.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_missing_container_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());

        let listing = store.list_with_metadata("videos").await.unwrap();
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn table_rows_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("albums.json");

        {
            let table = FsEntityTable::open(&path).unwrap();
            table.insert(TableRow::new("holiday", "")).await.unwrap();
            table
                .insert(TableRow::new("holiday", "beach.jpg"))
                .await
                .unwrap();
        }

        let table = FsEntityTable::open(&path).unwrap();
        assert!(table.get("holiday", "").await.is_ok());
        assert_eq!(table.query_partition("holiday").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_fails_already_exists() {
        let dir = TempDir::new().unwrap();
        let table = FsEntityTable::open(dir.path().join("albums.json")).unwrap();

        table.insert(TableRow::new("holiday", "")).await.unwrap();
        assert!(matches!(
            table.insert(TableRow::new("holiday", "")).await,
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let table = FsEntityTable::open(dir.path().join("albums.json")).unwrap();

        table.insert(TableRow::new("holiday", "a.jpg")).await.unwrap();
        table.delete("holiday", "a.jpg").await.unwrap();
        table.delete("holiday", "a.jpg").await.unwrap();

        assert!(matches!(
            table.get("holiday", "a.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
