//! HTTP surface for huebox.
//!
//! Routes: start a job (`POST /process`), stream progress
//! (`GET /status_updates`, SSE), fetch a rendered result page
//! (`GET /v/{id}`), plus static file serving for frame images and the
//! index page. Every response carries a stable `user_id` cookie that
//! keys the progress channel topic.

pub mod config;
pub mod error;
pub mod gallery;
pub mod identity;
pub mod routes;
pub mod state;
