//! External tool integration: subprocess invocation, media acquisition
//! (yt-dlp) and frame sampling (ffmpeg).
//!
//! Only the tools' input/output contracts live here; everything is
//! driven through [`invoke::run_tool`], so a non-zero exit from any tool
//! surfaces uniformly as [`huebox_core::error::StageError::ExternalTool`].

pub mod ffmpeg;
pub mod invoke;
pub mod ytdlp;
