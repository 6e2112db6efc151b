//! The per-job stage state machine.
//!
//! Exactly one orchestrator exists per job. It owns the job folder and
//! the job's record store for the job's lifetime, publishes a progress
//! update on every stage entry (and per analyzed frame), and converts
//! any stage failure into a single terminal error event. No stage is
//! retried, and a started job cannot be cancelled — it runs to
//! `complete` or `error`.

use std::path::PathBuf;
use std::sync::Arc;

use huebox_core::error::StageError;
use huebox_core::palette;
use huebox_core::progress::ProgressUpdate;
use huebox_core::types::{validate_duration, ColorCluster, FrameRecord, JobDetails};
use huebox_events::ProgressChannel;
use huebox_media::{ffmpeg, ytdlp};
use huebox_store::JobStore;

/// Filename of the transient downloaded media inside the job folder.
pub const MEDIA_FILE: &str = "video.mp4";

/// External tool binaries, configurable per deployment (and per test).
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub yt_dlp_bin: String,
    pub ffmpeg_bin: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            yt_dlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
        }
    }
}

/// Shared context handed to every orchestrator.
pub struct JobContext {
    /// Root folder that job folders are created under.
    pub data_dir: PathBuf,
    pub tools: ToolConfig,
    pub channel: Arc<dyn ProgressChannel>,
}

/// Topic key for a subscriber identity.
pub fn topic_for(subscriber: &str) -> String {
    format!("user:{subscriber}")
}

/// Drives one job through the stage sequence.
pub struct Orchestrator {
    job_id: String,
    folder: PathBuf,
    topic: String,
    ctx: Arc<JobContext>,
    source_url: String,
    quality: String,
}

impl Orchestrator {
    /// Create the job folder and an orchestrator owning it exclusively.
    pub async fn create(
        ctx: Arc<JobContext>,
        source_url: String,
        quality: String,
        subscriber: &str,
    ) -> Result<Self, StageError> {
        let job_id = uuid::Uuid::new_v4().simple().to_string();
        let folder = ctx.data_dir.join(&job_id);
        tokio::fs::create_dir_all(&folder).await?;

        Ok(Self {
            topic: topic_for(subscriber),
            job_id,
            folder,
            ctx,
            source_url,
            quality,
        })
    }

    /// The generated job id.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Launch the run as a detached task and return the job id.
    ///
    /// The caller never awaits completion; pipeline failures surface
    /// only on the progress channel, never here.
    pub fn spawn(self) -> String {
        let job_id = self.job_id.clone();
        tokio::spawn(self.run());
        job_id
    }

    /// Drive the job to a terminal state.
    ///
    /// Single catch point: any stage error becomes one terminal error
    /// event. Intermediate artifacts of a failed run are intentionally
    /// left in the job folder for inspection.
    pub async fn run(self) {
        tracing::info!(job_id = %self.job_id, url = %self.source_url, "Job started");
        match self.execute().await {
            Ok(()) => tracing::info!(job_id = %self.job_id, "Job complete"),
            Err(err) => {
                tracing::error!(job_id = %self.job_id, error = %err, "Job failed");
                self.publish(ProgressUpdate::Error {
                    message: err.to_string(),
                })
                .await;
            }
        }
    }

    async fn execute(&self) -> Result<(), StageError> {
        // The store exists from the first moment of the job, so even a
        // run rejected before download leaves a readable, empty store.
        let mut store = JobStore::create(&self.folder).await?;

        self.publish(ProgressUpdate::FetchingMetadata).await;
        let meta = ytdlp::resolve_metadata(&self.ctx.tools.yt_dlp_bin, &self.source_url).await?;
        validate_duration(meta.duration_seconds)?;

        self.publish(ProgressUpdate::Downloading {
            title: meta.title.clone(),
            quality: self.quality.clone(),
        })
        .await;
        let media_path = self.folder.join(MEDIA_FILE);
        ytdlp::fetch(
            &self.ctx.tools.yt_dlp_bin,
            &self.source_url,
            &media_path,
            &self.quality,
        )
        .await?;

        self.publish(ProgressUpdate::ExtractingFrames).await;
        let frames = ffmpeg::sample_frames(
            &self.ctx.tools.ffmpeg_bin,
            &media_path,
            &self.folder,
            ffmpeg::DEFAULT_INTERVAL_SECS,
            ffmpeg::DEFAULT_SCALE_WIDTH,
        )
        .await?;

        store
            .insert_details(JobDetails {
                name: meta.title,
                url: meta.canonical_url,
                length_seconds: meta.duration_seconds,
                created_at: chrono::Utc::now(),
            })
            .await?;

        let total = frames.len();
        self.publish(ProgressUpdate::Analyzing { completed: 0, total }).await;
        for (index, frame_path) in frames.iter().enumerate() {
            let analysis = analyze_on_worker(frame_path.clone()).await?;
            let frame_name = frame_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| StageError::Stage("frame path has no filename".to_string()))?;
            store.append_frame(FrameRecord { frame_name, analysis }).await?;
            self.publish(ProgressUpdate::Analyzing {
                completed: index + 1,
                total,
            })
            .await;
        }

        self.publish(ProgressUpdate::BuildingPage).await;
        crate::page::build_page(&self.folder, &self.source_url, store.details(), store.frames())
            .await?;

        // The raw download was only needed for sampling; drop it now
        // that the job succeeded. Error paths keep it.
        tokio::fs::remove_file(&media_path).await?;

        self.publish(ProgressUpdate::Complete {
            job_id: self.job_id.clone(),
            video_url: format!("/v/{}", self.job_id),
        })
        .await;
        Ok(())
    }

    async fn publish(&self, update: ProgressUpdate) {
        self.ctx.channel.publish(&self.topic, update).await;
    }
}

/// Clustering is CPU-bound and long enough to starve I/O-bound work;
/// run it on the blocking pool instead of inline.
async fn analyze_on_worker(path: PathBuf) -> Result<Vec<ColorCluster>, StageError> {
    tokio::task::spawn_blocking(move || palette::analyze_image(&path, palette::DEFAULT_CLUSTERS))
        .await
        .map_err(|e| StageError::Stage(format!("analysis task failed: {e}")))?
}
