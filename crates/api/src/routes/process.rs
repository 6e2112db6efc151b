//! Start-job route.
//!
//! Creates the job folder, launches the orchestrator as a detached task
//! and acknowledges immediately. The response says nothing about job
//! status — progress flows only through `/status_updates`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::HeaderMap;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;
use validator::Validate;

use huebox_media::ytdlp::DEFAULT_QUALITY;
use huebox_pipeline::Orchestrator;

use crate::error::{AppError, AppResult};
use crate::identity::{new_identity, subscriber_id};
use crate::state::AppState;

/// Form payload of `POST /process`.
#[derive(Debug, Deserialize, Validate)]
pub struct StartJobRequest {
    /// Remote media reference.
    #[validate(url)]
    pub url: String,
    /// Quality hint, e.g. `360p`. Defaults to [`DEFAULT_QUALITY`].
    pub quality: Option<String>,
}

/// POST /process
pub async fn start_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<StartJobRequest>,
) -> AppResult<Html<&'static str>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // A request that arrives before its first response carries no
    // cookie yet; events for that run go to a topic nobody watches.
    let identity = subscriber_id(&headers).unwrap_or_else(new_identity);
    let quality = input.quality.unwrap_or_else(|| DEFAULT_QUALITY.to_string());

    let orchestrator =
        Orchestrator::create(Arc::clone(&state.jobs), input.url, quality, &identity).await?;
    let job_id = orchestrator.spawn();
    tracing::info!(job_id = %job_id, "Job accepted");

    Ok(Html("<div id=\"form\">yes it chief, one moment</div>"))
}
