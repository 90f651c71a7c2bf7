use super::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row in the partition/row keyed table. For album membership the
/// partition is the album name and the row key is the member filename; an
/// empty row key marks the album's own existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub partition: String,
    pub row: String,
    pub created_at: DateTime<Utc>,
}

impl TableRow {
    pub fn new(partition: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            row: row.into(),
            created_at: Utc::now(),
        }
    }
}

/// Keyed table with standard partition/row semantics: `insert` fails
/// `AlreadyExists` on a duplicate key, `get` fails `NotFound`, `delete` is
/// idempotent.
#[async_trait]
pub trait EntityTable: Send + Sync {
    async fn insert(&self, row: TableRow) -> Result<(), StorageError>;

    async fn get(&self, partition: &str, row: &str) -> Result<TableRow, StorageError>;

    async fn delete(&self, partition: &str, row: &str) -> Result<(), StorageError>;

    async fn query_partition(&self, partition: &str) -> Result<Vec<TableRow>, StorageError>;

    async fn query_all(&self) -> Result<Vec<TableRow>, StorageError>;
}
