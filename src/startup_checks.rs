use crate::{Config, DEFAULT_TOKEN_SECRET, StorageBackend};
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create storage root: {0}")]
    StorageRootCreationFailed(#[from] std::io::Error),

    #[error("Frame extraction tool not available: {0}")]
    FrameToolMissing(String),

    #[error("Token secret is still the default value")]
    DefaultTokenSecret,
}

impl StartupCheckError {
    /// Critical failures stop the server; the rest degrade specific
    /// features and only warrant a warning.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::StorageRootCreationFailed(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if config.storage.backend == StorageBackend::Filesystem {
        let root = &config.storage.root;
        if root.exists() {
            info!("Storage root exists: {:?}", root);
        } else {
            info!("Storage root does not exist, creating: {:?}", root);
            if let Err(e) = tokio::fs::create_dir_all(root).await {
                error!("Failed to create storage root {:?}: {}", root, e);
                errors.push(StartupCheckError::StorageRootCreationFailed(e));
            }
        }
    }

    // Video thumbnails need the external extraction tool; its absence is
    // reported here rather than discovered on the first video upload.
    let tool = &config.thumbnail.video_tool;
    match Command::new(tool).arg("-version").output().await {
        Ok(output) if output.status.success() => {
            info!("Frame extraction tool available: {}", tool);
        }
        Ok(output) => {
            warn!(
                "Frame extraction tool {} exited with {} on version probe",
                tool, output.status
            );
            errors.push(StartupCheckError::FrameToolMissing(tool.clone()));
        }
        Err(e) => {
            warn!("Frame extraction tool {} not found: {}", tool, e);
            errors.push(StartupCheckError::FrameToolMissing(tool.clone()));
        }
    }

    if config.tokens.secret == DEFAULT_TOKEN_SECRET {
        warn!("Token secret is still the default; signed URLs are guessable");
        errors.push(StartupCheckError::DefaultTokenSecret);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        warn!("Startup checks finished with {} findings", errors.len());
        Err(errors)
    }
}
