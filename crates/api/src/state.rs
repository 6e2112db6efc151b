use std::sync::Arc;

use huebox_pipeline::JobContext;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Context handed to every spawned job orchestrator. Its `channel`
    /// is also the relay's subscription endpoint.
    pub jobs: Arc<JobContext>,
}
