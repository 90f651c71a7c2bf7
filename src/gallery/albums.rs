use super::GalleryError;
use crate::storage::{EntityTable, StorageError, TableRow};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Query surface over the album table. Partition key is the album name, row
/// key is the member filename, and a row with an empty row key marks that
/// the album itself exists. A filename may belong to any number of albums.
pub struct AlbumIndex {
    table: Arc<dyn EntityTable>,
}

impl AlbumIndex {
    pub fn new(table: Arc<dyn EntityTable>) -> Self {
        Self { table }
    }

    /// Create an album by writing its existence marker. Fails
    /// `AlreadyExists` when the album is already present.
    pub async fn create(&self, album: &str) -> Result<(), GalleryError> {
        match self.table.insert(TableRow::new(album, "")).await {
            Ok(()) => Ok(()),
            Err(StorageError::AlreadyExists(_)) => {
                Err(GalleryError::AlreadyExists(format!("album {}", album)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove an album and all of its membership rows. The underlying
    /// assets are not touched.
    pub async fn delete(&self, album: &str) -> Result<(), GalleryError> {
        let rows = self.table.query_partition(album).await?;
        for row in rows {
            self.table.delete(&row.partition, &row.row).await?;
        }
        Ok(())
    }

    /// All album names, i.e. partitions carrying an existence marker.
    pub async fn list(&self) -> Result<Vec<String>, GalleryError> {
        let rows = self.table.query_all().await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.row.is_empty())
            .map(|row| row.partition)
            .collect())
    }

    /// Add a filename to an album. Fails `NotFound` when the album was
    /// never created.
    pub async fn add(&self, album: &str, filename: &str) -> Result<(), GalleryError> {
        match self.table.get(album, "").await {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => {
                return Err(GalleryError::NotFound(format!("album {}", album)));
            }
            Err(err) => return Err(err.into()),
        }

        match self.table.insert(TableRow::new(album, filename)).await {
            Ok(()) | Err(StorageError::AlreadyExists(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a filename from one album, leaving the asset and its other
    /// memberships alone.
    pub async fn remove(&self, album: &str, filename: &str) -> Result<(), GalleryError> {
        self.table.delete(album, filename).await?;
        Ok(())
    }

    /// Member filenames of one album. Fails `NotFound` when the album does
    /// not exist; an existing album may legitimately be empty.
    pub async fn members(&self, album: &str) -> Result<HashSet<String>, GalleryError> {
        match self.table.get(album, "").await {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => {
                return Err(GalleryError::NotFound(format!("album {}", album)));
            }
            Err(err) => return Err(err.into()),
        }

        let rows = self.table.query_partition(album).await?;
        Ok(rows
            .into_iter()
            .filter(|row| !row.row.is_empty())
            .map(|row| row.row)
            .collect())
    }

    /// Every filename claimed by any album. Drives the "unclaimed" default
    /// gallery view.
    pub async fn claimed_filenames(&self) -> Result<HashSet<String>, GalleryError> {
        let rows = self.table.query_all().await?;
        Ok(rows
            .into_iter()
            .filter(|row| !row.row.is_empty())
            .map(|row| row.row)
            .collect())
    }

    /// Drop a filename from every album, used when the asset itself is
    /// deleted.
    pub async fn remove_from_all(&self, filename: &str) -> Result<(), GalleryError> {
        let rows = self.table.query_all().await?;
        for row in rows.into_iter().filter(|row| row.row == filename) {
            self.table.delete(&row.partition, &row.row).await?;
        }
        Ok(())
    }

    /// Rename an album by copying every row under the new partition and then
    /// deleting the old rows; partition keys are immutable in the underlying
    /// table. Not atomic: a crash mid-rename leaves both partitions
    /// partially populated.
    pub async fn rename(&self, album: &str, new_name: &str) -> Result<(), GalleryError> {
        let rows = self.table.query_partition(album).await?;
        for row in rows {
            self.table
                .insert(TableRow {
                    partition: new_name.to_string(),
                    row: row.row.clone(),
                    created_at: row.created_at,
                })
                .await?;
            self.table.delete(&row.partition, &row.row).await?;
        }
        info!("renamed album {} to {}", album, new_name);
        Ok(())
    }
}
