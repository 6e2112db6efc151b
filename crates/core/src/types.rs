//! Job data model shared by the pipeline, the store, and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Maximum length of a stored video title, in characters.
pub const MAX_TITLE_LEN: usize = 15;

/// Longest accepted source duration, in seconds.
///
/// Jobs whose resolved duration falls outside `(0, MAX_DURATION_SECS]`
/// are rejected before any download happens.
pub const MAX_DURATION_SECS: u32 = 60;

/// Details of one processed video. Written exactly once per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetails {
    /// Video title, truncated to [`MAX_TITLE_LEN`] characters.
    pub name: String,
    /// Canonical source URL as reported by the resolver.
    pub url: String,
    /// Source duration in whole seconds.
    pub length_seconds: u32,
    /// When the job record was created (UTC).
    pub created_at: DateTime<Utc>,
}

/// One dominant-color cluster of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCluster {
    /// Centroid color as `[r, g, b]`.
    pub color_rgb: [u8; 3],
    /// Share of the frame's pixels assigned to this cluster, rounded to
    /// the nearest integer percent. A cluster that ends up with no
    /// pixels reports 0.
    pub percentage: u8,
}

/// Analysis result for one sampled frame.
///
/// Records are appended in analysis order and become immutable once the
/// job reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame filename inside the job folder, e.g. `frame_03.jpg`.
    pub frame_name: String,
    /// Clusters in ascending hue/saturation/lightness order.
    pub analysis: Vec<ColorCluster>,
}

/// Truncate a resolved title to the stored maximum.
pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_LEN).collect()
}

/// Check a resolved duration against the accepted window.
pub fn validate_duration(duration_seconds: u32) -> Result<(), StageError> {
    if duration_seconds == 0 || duration_seconds > MAX_DURATION_SECS {
        return Err(StageError::Acquisition(
            "Invalid or unsupported video duration (must be between 1 and 60 seconds)".to_string(),
        ));
    }
    Ok(())
}
