use super::thumbnail::ThumbnailError;
use crate::storage::StorageError;
use crate::tokens::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

// Key-level storage outcomes surface under the gallery's own taxonomy so
// handlers can map them without reaching into the storage layer.
impl From<StorageError> for GalleryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => GalleryError::NotFound(what),
            StorageError::AlreadyExists(what) => GalleryError::AlreadyExists(what),
            other => GalleryError::Storage(other),
        }
    }
}
