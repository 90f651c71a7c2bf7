// Gallery module - Main entry point
mod albums;
mod core;
mod error;
mod handlers;
mod metadata;
pub mod thumbnail;

// Re-export public items
pub use albums::AlbumIndex;
pub use core::LAST_MODIFIED_KEY;
pub use error::GalleryError;
pub use handlers::{
    MediaView, UploadOutcome, add_to_album_handler, album_media_handler, album_thumbnail_handler,
    create_album_handler, delete_album_handler, delete_media_handler, health_handler,
    list_albums_handler, list_media_handler, media_content_handler, media_original_handler,
    media_thumbnail_handler, remove_from_album_handler, rename_album_handler,
    thumbnail_content_handler, upload_media_handler, upload_to_album_handler,
};
pub use thumbnail::{ThumbnailSpec, Thumbnailer};

use crate::storage::{BlobStore, EntityTable};
use crate::token_cache::RefreshCache;
use crate::tokens::{AccessToken, TokenIssuer};
use chrono::Duration;
use std::sync::Arc;

pub type SharedGallery = Arc<Gallery>;

/// The media gallery service: originals and thumbnails in blob containers,
/// album membership in a keyed table, capability tokens issued on demand and
/// cached per container.
pub struct Gallery {
    pub(crate) storage: crate::StorageConfig,
    pub(crate) blob_base_url: String,
    pub(crate) token_refresh: Duration,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) albums: AlbumIndex,
    pub(crate) thumbnailer: Thumbnailer,
    pub(crate) issuer: TokenIssuer,
    pub(crate) tokens: RefreshCache<String, AccessToken>,
}

impl Gallery {
    pub fn new(
        config: &crate::Config,
        blobs: Arc<dyn BlobStore>,
        table: Arc<dyn EntityTable>,
    ) -> Self {
        let issuer = TokenIssuer::new(
            config.tokens.secret.clone(),
            Duration::minutes(config.tokens.validity_minutes as i64),
            Duration::minutes(config.tokens.clock_skew_minutes as i64),
        );

        Self {
            storage: config.storage.clone(),
            blob_base_url: config.app.blob_base_url.clone(),
            token_refresh: Duration::minutes(config.tokens.refresh_interval_minutes as i64),
            blobs,
            albums: AlbumIndex::new(table),
            thumbnailer: Thumbnailer::new(ThumbnailSpec::from(&config.thumbnail)),
            issuer,
            tokens: RefreshCache::new(),
        }
    }

    pub fn albums(&self) -> &AlbumIndex {
        &self.albums
    }
}
