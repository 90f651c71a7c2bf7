use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("unsupported media format")]
    UnsupportedFormat,

    #[error("failed to decode media: {0}")]
    Decode(#[from] image::ImageError),

    #[error("frame extraction tool not available: {0}")]
    ToolUnavailable(String),

    #[error("frame extraction failed (status {status}): {stderr}")]
    ToolFailed { status: i32, stderr: String },

    #[error("frame extraction produced no output")]
    EmptyOutput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ThumbnailError {
    /// True when the failure indicates the asset itself cannot be read, as
    /// opposed to a problem with the generation environment.
    pub fn is_unreadable_input(&self) -> bool {
        matches!(
            self,
            ThumbnailError::UnsupportedFormat | ThumbnailError::Decode(_)
        )
    }
}
