//! Frame sampling through ffmpeg.
//!
//! One invocation extracts the whole fixed-interval sequence; frames are
//! numbered from zero and scaled to a fixed width with the aspect ratio
//! preserved.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use huebox_core::error::StageError;

use crate::invoke::run_tool;

/// Seconds of source per sampled frame.
pub const DEFAULT_INTERVAL_SECS: u32 = 3;

/// Width sampled frames are scaled to; height preserves aspect.
pub const DEFAULT_SCALE_WIDTH: u32 = 320;

/// JPEG quality factor (2–31, higher is worse). 8 is compact but still
/// good enough for clustering.
const JPEG_QUALITY: u32 = 8;

/// Extract one still per `interval_secs` of source into `out_dir`.
///
/// Frames are written as `frame_00.jpg`, `frame_01.jpg`, ... and
/// returned sorted by ascending index. The final frame of a clipped
/// source may fall short of the nominal interval; callers must not
/// assume interval regularity there. Fails with
/// [`StageError::Sampling`] if zero frames were produced.
pub async fn sample_frames(
    bin: &str,
    media_path: &Path,
    out_dir: &Path,
    interval_secs: u32,
    scale_width: u32,
) -> Result<Vec<PathBuf>, StageError> {
    let pattern = out_dir.join("frame_%02d.jpg");
    let filter = format!("fps=1/{interval_secs},scale={scale_width}:-1");

    let mut cmd = Command::new(bin);
    cmd.arg("-i")
        .arg(media_path)
        .args(["-vf", &filter])
        .args(["-q:v", &JPEG_QUALITY.to_string()])
        .args(["-start_number", "0"])
        .arg(&pattern)
        .arg("-y");
    run_tool(cmd).await?;

    let frames = list_frames(out_dir).await?;
    if frames.is_empty() {
        return Err(StageError::Sampling(
            "No frames were extracted from the video".to_string(),
        ));
    }

    tracing::debug!(count = frames.len(), dir = %out_dir.display(), "Frames sampled");
    Ok(frames)
}

/// Scan `dir` for `frame_*.jpg`, sorted by filename. Indices are
/// zero-padded, so lexical order is index order.
pub async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, StageError> {
    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("frame_") && name.ends_with(".jpg") {
            frames.push(entry.path());
        }
    }
    frames.sort();
    Ok(frames)
}
