//! Media acquisition through yt-dlp.
//!
//! Two operations: metadata resolution (`-J --skip-download`) and a
//! quality-bounded download. The binary is configurable so deployments
//! can pin a path and tests can substitute a stub.

use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

use huebox_core::error::StageError;
use huebox_core::types::truncate_title;

use crate::invoke::run_tool;

/// Default vertical resolution bound for downloads.
pub const DEFAULT_QUALITY: &str = "360p";

/// Height used when a quality hint does not parse.
const FALLBACK_HEIGHT: u32 = 360;

/// Resolved metadata for a remote media reference.
#[derive(Debug, Clone)]
pub struct MediaMetadata {
    /// Duration in whole seconds; 0 when the source reports none.
    pub duration_seconds: u32,
    /// Title, already truncated to the stored maximum.
    pub title: String,
    /// Canonical URL; falls back to the requested URL.
    pub canonical_url: String,
}

/// The `yt-dlp -J` payload, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

/// Resolve title, canonical URL and duration without downloading.
pub async fn resolve_metadata(bin: &str, url: &str) -> Result<MediaMetadata, StageError> {
    let mut cmd = Command::new(bin);
    cmd.args(["-J", "--skip-download", url]);
    let out = run_tool(cmd).await?;

    let info: InfoJson = serde_json::from_str(out.stdout.trim())?;
    Ok(MediaMetadata {
        duration_seconds: info.duration.unwrap_or(0.0) as u32,
        title: truncate_title(info.title.as_deref().unwrap_or("")),
        canonical_url: info.webpage_url.unwrap_or_else(|| url.to_string()),
    })
}

/// Download the media item to `dest`, bounded by the quality hint.
///
/// The format selector degrades to "best available at or below" the
/// requested height; the exact fallback ordering is the tool's concern.
/// Fails with [`StageError::Acquisition`] if the tool reports success
/// but `dest` is absent or empty.
pub async fn fetch(bin: &str, url: &str, dest: &Path, quality: &str) -> Result<(), StageError> {
    let height = height_bound(quality);
    let format = format!("best[height<={height}][ext=mp4]/best[height<={height}]/best");

    let mut cmd = Command::new(bin);
    cmd.args(["-f", &format, "--merge-output-format", "mp4", "-o"])
        .arg(dest)
        .arg(url);
    run_tool(cmd).await?;

    let len = tokio::fs::metadata(dest).await.map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(StageError::Acquisition(
            "Video download did not produce a valid file".to_string(),
        ));
    }

    tracing::debug!(dest = %dest.display(), bytes = len, "Media downloaded");
    Ok(())
}

/// Parse a `"<n>p"` quality hint into a height bound.
fn height_bound(quality: &str) -> u32 {
    quality
        .strip_suffix('p')
        .unwrap_or(quality)
        .parse()
        .unwrap_or(FALLBACK_HEIGHT)
}
