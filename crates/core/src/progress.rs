//! Job progress state machine and its wire shape.
//!
//! Stages advance strictly in order, each with a fixed progress
//! checkpoint; the analysis stage ramps linearly from 40 to 90 as frames
//! complete. Job creation itself (progress 0) publishes nothing; the
//! first published update is [`ProgressUpdate::FetchingMetadata`].
//! `Complete` and `Error` are terminal — no further updates are
//! published for that job afterwards.

/// Wire value for the metadata resolution stage.
pub const STATUS_FETCHING_METADATA: &str = "fetching_metadata";
/// Wire value for the media download stage.
pub const STATUS_DOWNLOADING: &str = "downloading";
/// Wire value for the frame extraction stage.
pub const STATUS_EXTRACTING_FRAMES: &str = "extracting_frames";
/// Wire value for the per-frame analysis stage.
pub const STATUS_ANALYZING: &str = "analyzing";
/// Wire value for the page render stage.
pub const STATUS_BUILDING_PAGE: &str = "building_page";
/// Wire value for successful completion.
pub const STATUS_COMPLETE: &str = "complete";
/// Wire value for terminal failure.
pub const STATUS_ERROR: &str = "error";

/// Progress checkpoint published on entry to the analysis stage.
const ANALYZE_START: u8 = 40;
/// Progress reported once every frame has been analyzed.
const ANALYZE_END: u8 = 90;

/// One published progress update for a job.
///
/// Closed set of stages; serialized to a flat `{status, message,
/// progress, ...}` JSON object via [`ProgressUpdate::to_wire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    FetchingMetadata,
    Downloading { title: String, quality: String },
    ExtractingFrames,
    Analyzing { completed: usize, total: usize },
    BuildingPage,
    Complete { job_id: String, video_url: String },
    Error { message: String },
}

impl ProgressUpdate {
    /// Wire status tag for this update.
    pub fn status(&self) -> &'static str {
        match self {
            Self::FetchingMetadata => STATUS_FETCHING_METADATA,
            Self::Downloading { .. } => STATUS_DOWNLOADING,
            Self::ExtractingFrames => STATUS_EXTRACTING_FRAMES,
            Self::Analyzing { .. } => STATUS_ANALYZING,
            Self::BuildingPage => STATUS_BUILDING_PAGE,
            Self::Complete { .. } => STATUS_COMPLETE,
            Self::Error { .. } => STATUS_ERROR,
        }
    }

    /// Progress value in 0..=100.
    ///
    /// Fixed checkpoint per stage; within analysis, a linear ramp over
    /// completed frames. Non-decreasing across a job's update sequence.
    pub fn progress(&self) -> u8 {
        match self {
            Self::FetchingMetadata => 5,
            Self::Downloading { .. } => 15,
            Self::ExtractingFrames => 35,
            Self::Analyzing { completed, total } => analyze_progress(*completed, *total),
            Self::BuildingPage => 95,
            Self::Complete { .. } => 100,
            Self::Error { .. } => 100,
        }
    }

    /// Human-readable status line shown by relays.
    pub fn message(&self) -> String {
        match self {
            Self::FetchingMetadata => "Getting video info...".to_string(),
            Self::Downloading { title, quality } => {
                format!("Downloading {title} in {quality}...")
            }
            Self::ExtractingFrames => "Extracting frames...".to_string(),
            Self::Analyzing { completed: 0, total } => format!("Analyzing {total} frames..."),
            Self::Analyzing { completed, total } => {
                format!("Analyzed {completed}/{total} frames...")
            }
            Self::BuildingPage => "Generating HTML page...".to_string(),
            Self::Complete { .. } => "Processing complete!".to_string(),
            Self::Error { message } => message.clone(),
        }
    }

    /// `Complete` and `Error` end a job's event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Flat wire shape: always `status`, `message` and `progress`;
    /// `complete` additionally carries `video_id` and `video_url`.
    pub fn to_wire(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "status": self.status(),
            "message": self.message(),
            "progress": self.progress(),
        });
        if let Self::Complete { job_id, video_url } = self {
            value["video_id"] = serde_json::Value::String(job_id.clone());
            value["video_url"] = serde_json::Value::String(video_url.clone());
        }
        value
    }
}

/// Linear 40→90 ramp over analyzed frames.
///
/// The stage-entry update uses `completed = 0` and reports exactly
/// [`ANALYZE_START`]; the final frame reports exactly [`ANALYZE_END`].
fn analyze_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return ANALYZE_START;
    }
    let span = (ANALYZE_END - ANALYZE_START) as usize;
    let done = completed.min(total);
    (ANALYZE_START as usize + span * done / total) as u8
}
