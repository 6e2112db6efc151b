//! Per-job document store.
//!
//! Each job folder carries a single `records.json` document with two
//! collections: `details`, written exactly once, and `frames`, appended
//! in analysis order. The document is rewritten on every insert through
//! a temp-file + fsync + rename sequence, so an insert has not completed
//! until the write is durable, a later reader sees every prior write,
//! and no reader ever observes a torn document.
//!
//! A store has exactly one writer — the orchestrator that created it —
//! and becomes read-only once the job reaches a terminal state, after
//! which concurrent readers (the gallery scan, the page builder) are
//! safe.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use huebox_core::error::StageError;
use huebox_core::types::{FrameRecord, JobDetails};

/// Filename of the per-job document inside the job folder.
pub const STORE_FILE: &str = "records.json";

/// The on-disk document: two append-only collections.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    details: Vec<JobDetails>,
    frames: Vec<FrameRecord>,
}

/// Handle to one job's document store.
pub struct JobStore {
    folder: PathBuf,
    doc: Document,
}

impl JobStore {
    /// Create an empty store in `folder` and persist the empty document.
    pub async fn create(folder: &Path) -> Result<Self, StageError> {
        let store = Self {
            folder: folder.to_path_buf(),
            doc: Document::default(),
        };
        store.flush().await?;
        Ok(store)
    }

    /// Open an existing store. Readers use this; they must not insert.
    pub async fn load(folder: &Path) -> Result<Self, StageError> {
        let raw = tokio::fs::read(folder.join(STORE_FILE)).await?;
        let doc = serde_json::from_slice(&raw)?;
        Ok(Self {
            folder: folder.to_path_buf(),
            doc,
        })
    }

    /// Write the job details. Allowed exactly once per store.
    pub async fn insert_details(&mut self, details: JobDetails) -> Result<(), StageError> {
        if !self.doc.details.is_empty() {
            return Err(StageError::Stage("job details already written".to_string()));
        }
        self.doc.details.push(details);
        self.flush().await
    }

    /// Append one frame record in analysis order.
    pub async fn append_frame(&mut self, frame: FrameRecord) -> Result<(), StageError> {
        self.doc.frames.push(frame);
        self.flush().await
    }

    /// All details rows (zero or one).
    pub fn details(&self) -> &[JobDetails] {
        &self.doc.details
    }

    /// All frame records, in insertion order.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.doc.frames
    }

    /// Serialize the document and atomically replace the store file.
    async fn flush(&self) -> Result<(), StageError> {
        let tmp = self.folder.join(format!("{STORE_FILE}.tmp"));
        let bytes = serde_json::to_vec_pretty(&self.doc)?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, self.folder.join(STORE_FILE)).await?;
        Ok(())
    }
}
