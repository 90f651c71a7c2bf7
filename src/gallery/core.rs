use super::{Gallery, GalleryError, metadata};
use crate::media::{MediaKind, MediaRecord, merge};
use crate::storage::BlobEntry;
use crate::tokens::AccessToken;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Metadata key holding the caller-supplied effective timestamp of an
/// object, as an ISO-8601 instant string.
pub const LAST_MODIFIED_KEY: &str = "lastModified";

/// The user-meaningful instant of a stored object: caller-supplied timestamp
/// metadata when present and parseable, otherwise the store's own
/// modification time.
fn effective_time(entry: &BlobEntry) -> DateTime<Utc> {
    entry
        .metadata
        .get(LAST_MODIFIED_KEY)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|instant| instant.with_timezone(&Utc))
        .unwrap_or(entry.last_modified)
}

impl Gallery {
    /// List one container's assets with their effective last-modified
    /// instant, ascending.
    pub async fn list_media(
        &self,
        container: &str,
        kind: MediaKind,
    ) -> Result<Vec<MediaRecord>, GalleryError> {
        let entries = self.blobs.list_with_metadata(container).await?;
        let mut records: Vec<MediaRecord> = entries
            .into_iter()
            .map(|entry| MediaRecord {
                last_modified: effective_time(&entry),
                filename: entry.name,
                kind,
            })
            .collect();
        records.sort();
        Ok(records)
    }

    pub async fn list_photos(&self) -> Result<Vec<MediaRecord>, GalleryError> {
        self.list_media(&self.storage.photos_container, MediaKind::Photo)
            .await
    }

    pub async fn list_videos(&self) -> Result<Vec<MediaRecord>, GalleryError> {
        self.list_media(&self.storage.videos_container, MediaKind::Video)
            .await
    }

    /// All media not claimed by any album, most recent first. Photos win
    /// exact-tie comparisons against videos.
    pub async fn recent_media(&self) -> Result<Vec<MediaRecord>, GalleryError> {
        let claimed = self.albums.claimed_filenames().await?;

        let mut photos = self.list_photos().await?;
        photos.retain(|record| !claimed.contains(&record.filename));
        let mut videos = self.list_videos().await?;
        videos.retain(|record| !claimed.contains(&record.filename));

        // Both streams arrive ascending; the merge needs them in the output
        // direction.
        photos.reverse();
        videos.reverse();
        Ok(merge(photos, videos, |record| record.last_modified, true))
    }

    /// One album's media, most recent first. Fails `NotFound` for an album
    /// that was never created.
    pub async fn album_media(&self, album: &str) -> Result<Vec<MediaRecord>, GalleryError> {
        let members = self.albums.members(album).await?;

        let mut photos = self.list_photos().await?;
        photos.retain(|record| members.contains(&record.filename));
        let mut videos = self.list_videos().await?;
        videos.retain(|record| members.contains(&record.filename));

        photos.reverse();
        videos.reverse();
        Ok(merge(photos, videos, |record| record.last_modified, true))
    }

    /// Store one uploaded asset: thumbnail first (so unreadable input aborts
    /// before anything is written), then the original and the thumbnail,
    /// both tagged with the same effective-timestamp metadata, then the
    /// optional album membership.
    ///
    /// Environment failures in thumbnail generation (missing or failing
    /// extraction tool) do not abort the upload; the asset is stored without
    /// a preview and the failure is logged.
    pub async fn upload_media(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        taken_at: Option<DateTime<Utc>>,
        album: Option<&str>,
    ) -> Result<MediaRecord, GalleryError> {
        let kind = MediaKind::from_filename(filename)
            .ok_or_else(|| GalleryError::UnsupportedMedia(filename.to_string()))?;

        let effective = taken_at
            .or_else(|| match kind {
                MediaKind::Photo => metadata::extract_capture_date(&bytes),
                MediaKind::Video => None,
            })
            .unwrap_or_else(Utc::now);

        let thumbnail = match self.thumbnailer.generate(bytes.clone(), kind).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(err) if err.is_unreadable_input() => return Err(err.into()),
            Err(err) => {
                warn!(
                    "thumbnail generation for {} failed, storing original without one: {}",
                    filename, err
                );
                None
            }
        };

        let mut blob_metadata = HashMap::new();
        blob_metadata.insert(LAST_MODIFIED_KEY.to_string(), effective.to_rfc3339());

        self.blobs
            .upload(self.container_for(kind), filename, &bytes, &blob_metadata)
            .await?;
        if let Some(thumbnail) = thumbnail {
            self.blobs
                .upload(
                    &self.storage.thumbnails_container,
                    filename,
                    &thumbnail,
                    &blob_metadata,
                )
                .await?;
        }

        if let Some(album) = album {
            self.albums.add(album, filename).await?;
        }

        info!("stored {} {}", kind.as_str(), filename);
        Ok(MediaRecord {
            last_modified: effective,
            filename: filename.to_string(),
            kind,
        })
    }

    /// Delete an asset, its thumbnail, and every album reference to it. A
    /// missing thumbnail is tolerated; a missing original is `NotFound`.
    pub async fn delete_media(&self, filename: &str) -> Result<(), GalleryError> {
        let kind = MediaKind::from_filename(filename)
            .ok_or_else(|| GalleryError::UnsupportedMedia(filename.to_string()))?;

        match self
            .blobs
            .delete(&self.storage.thumbnails_container, filename)
            .await
        {
            Ok(()) => {}
            Err(crate::storage::StorageError::NotFound(_)) => {
                debug!("no thumbnail to delete for {}", filename);
            }
            Err(err) => return Err(err.into()),
        }

        self.blobs.delete(self.container_for(kind), filename).await?;
        self.albums.remove_from_all(filename).await?;

        info!("deleted {} {}", kind.as_str(), filename);
        Ok(())
    }

    pub async fn download_media(&self, filename: &str) -> Result<(MediaKind, Vec<u8>), GalleryError> {
        let kind = MediaKind::from_filename(filename)
            .ok_or_else(|| GalleryError::UnsupportedMedia(filename.to_string()))?;
        let bytes = self
            .blobs
            .download(self.container_for(kind), filename)
            .await?;
        Ok((kind, bytes))
    }

    pub async fn download_thumbnail(&self, filename: &str) -> Result<Vec<u8>, GalleryError> {
        Ok(self
            .blobs
            .download(&self.storage.thumbnails_container, filename)
            .await?)
    }

    /// Time-limited browser-facing URL for an asset's thumbnail.
    pub fn thumbnail_url(&self, filename: &str) -> Result<String, GalleryError> {
        self.signed_url(&self.storage.thumbnails_container, filename)
    }

    /// Time-limited browser-facing URL for an original asset.
    pub fn media_url(&self, filename: &str, kind: MediaKind) -> Result<String, GalleryError> {
        self.signed_url(self.container_for(kind), filename)
    }

    fn signed_url(&self, container: &str, filename: &str) -> Result<String, GalleryError> {
        let token = self.container_token(container)?;
        Ok(format!(
            "{}/{}/{}?{}",
            self.blob_base_url.trim_end_matches('/'),
            container,
            urlencoding::encode(filename),
            token.query
        ))
    }

    fn container_token(&self, container: &str) -> Result<AccessToken, GalleryError> {
        let token = self
            .tokens
            .get_or_refresh(container.to_string(), self.token_refresh, || {
                let token = self.issuer.issue(container)?;
                let issued_at = token.issued_at;
                Ok::<_, crate::tokens::TokenError>((token, issued_at))
            })?;
        Ok(token)
    }

    pub(crate) fn container_for(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Photo => &self.storage.photos_container,
            MediaKind::Video => &self.storage.videos_container,
        }
    }
}
