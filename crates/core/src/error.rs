//! Pipeline error taxonomy.
//!
//! Every failure inside a job's stage sequence maps onto one of these
//! variants. The orchestrator catches the error exactly once, at the top
//! of the pipeline, and converts it into a single terminal error event;
//! no stage is retried.

/// Error raised by any stage of the job pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// An external tool exited non-zero.
    #[error("external tool exited with code {exit_code}: {stderr}")]
    ExternalTool { exit_code: i32, stderr: String },

    /// The acquired media is unusable: missing or empty output despite a
    /// success exit, or a duration outside the accepted window.
    #[error("{0}")]
    Acquisition(String),

    /// Frame sampling produced zero frames.
    #[error("{0}")]
    Sampling(String),

    /// Any other failure inside a stage (store write, page render, ...).
    #[error("{0}")]
    Stage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
}
