// Thumbnail pipeline - fixed-box previews for photos (in-process) and
// videos (external frame extraction)
mod error;
mod image;
mod video;

pub use error::ThumbnailError;

use crate::media::MediaKind;

/// Fixed output contract for generated previews, selected once from
/// configuration and shared by both generation strategies.
#[derive(Debug, Clone)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub video_tool: String,
    pub video_seek_seconds: f32,
}

impl From<&crate::ThumbnailConfig> for ThumbnailSpec {
    fn from(config: &crate::ThumbnailConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            jpeg_quality: config.jpeg_quality,
            video_tool: config.video_tool.clone(),
            video_seek_seconds: config.video_seek_seconds,
        }
    }
}

#[derive(Clone)]
pub struct Thumbnailer {
    spec: ThumbnailSpec,
}

impl Thumbnailer {
    pub fn new(spec: ThumbnailSpec) -> Self {
        Self { spec }
    }

    /// Produce JPEG preview bytes for raw asset bytes of the declared kind.
    ///
    /// Photos decode and resample in-process on a blocking thread; videos go
    /// through the external frame-extraction tool. Both strategies emit the
    /// same fixed target box.
    pub async fn generate(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<Vec<u8>, ThumbnailError> {
        match kind {
            MediaKind::Photo => {
                let spec = self.spec.clone();
                tokio::task::spawn_blocking(move || image::render_photo_thumbnail(&bytes, &spec))
                    .await?
            }
            MediaKind::Video => video::render_video_thumbnail(&bytes, &self.spec).await,
        }
    }
}

#[cfg(test)]
mod tests {
    mod image_tests;
    mod video_tests;
}
