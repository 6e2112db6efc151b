//! Route definitions.
//!
//! ```text
//! GET  /health          health_check
//! POST /process         start_job
//! GET  /status_updates  status_updates (SSE)
//! GET  /v/{id}          video_page
//! GET  /static/*        static assets
//! GET  /videos/*        job folders (frame images)
//! GET  /               index page
//! ```

pub mod health;
pub mod process;
pub mod status;
pub mod video;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the full application router.
pub fn router(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/process", post(process::start_job))
        .route("/status_updates", get(status::status_updates))
        .route("/v/{id}", get(video::video_page))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/videos", ServeDir::new(&config.data_dir))
        .route_service("/", ServeFile::new(&config.index_file))
}
