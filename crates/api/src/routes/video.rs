//! Result-page route. Read-only, no side effects.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use huebox_pipeline::PAGE_FILE;

use crate::state::AppState;

/// GET /v/{id} -- serve a job's rendered result page.
pub async fn video_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // Job ids are flat folder names; anything path-shaped is not ours.
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return (StatusCode::NOT_FOUND, "video page not found").into_response();
    }

    let page = state.config.data_dir.join(&id).join(PAGE_FILE);
    match tokio::fs::read_to_string(&page).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "video page not found").into_response(),
    }
}
