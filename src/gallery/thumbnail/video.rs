use super::{ThumbnailError, ThumbnailSpec};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Extract a single frame from video bytes via the external tool and return
/// it as JPEG bytes scaled and cropped to the target box.
pub(super) async fn render_video_thumbnail(
    bytes: &[u8],
    spec: &ThumbnailSpec,
) -> Result<Vec<u8>, ThumbnailError> {
    let tool = resolve_tool(&spec.video_tool)?;

    // The extraction tool needs seekable input, which an upload stream is
    // not, so spool the bytes to disk first. NamedTempFile removes the file
    // on drop, which covers every return path below.
    let input = tempfile::NamedTempFile::new()?;
    tokio::fs::write(input.path(), bytes).await?;

    // Seek past likely-black leading frames, take one frame, scale to cover
    // the target box, crop to exact dimensions, emit MJPEG on stdout.
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = spec.width,
        h = spec.height
    );
    let output = Command::new(&tool)
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-ss")
        .arg(spec.video_seek_seconds.to_string())
        .arg("-i")
        .arg(input.path())
        .arg("-frames:v")
        .arg("1")
        .arg("-vf")
        .arg(&filter)
        .arg("-f")
        .arg("image2pipe")
        .arg("-vcodec")
        .arg("mjpeg")
        .arg("pipe:1")
        .output()
        .await?;

    if !output.status.success() {
        return Err(ThumbnailError::ToolFailed {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if output.stdout.is_empty() {
        return Err(ThumbnailError::EmptyOutput);
    }

    debug!(
        "extracted {} byte video frame via {:?}",
        output.stdout.len(),
        tool
    );
    Ok(output.stdout)
}

/// Resolve the configured extraction tool to an executable path. A bare name
/// is searched on PATH; anything with a separator must exist as given.
fn resolve_tool(tool: &str) -> Result<PathBuf, ThumbnailError> {
    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        return Err(ThumbnailError::ToolUnavailable(tool.to_string()));
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&search_path) {
        let full = dir.join(tool);
        if full.is_file() {
            return Ok(full);
        }
    }

    Err(ThumbnailError::ToolUnavailable(tool.to_string()))
}
