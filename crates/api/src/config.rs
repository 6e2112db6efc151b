use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Root folder job folders are created under (default: `videos`).
    pub data_dir: PathBuf,
    /// Folder served at `/static/` (default: `static`).
    pub static_dir: PathBuf,
    /// File served at `/` (default: `index.html`).
    pub index_file: PathBuf,
    /// yt-dlp binary (default: `yt-dlp`).
    pub yt_dlp_bin: String,
    /// ffmpeg binary (default: `ffmpeg`).
    pub ffmpeg_bin: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var      | Default      |
    /// |--------------|--------------|
    /// | `HOST`       | `0.0.0.0`    |
    /// | `PORT`       | `3000`       |
    /// | `DATA_DIR`   | `videos`     |
    /// | `STATIC_DIR` | `static`     |
    /// | `INDEX_FILE` | `index.html` |
    /// | `YT_DLP_BIN` | `yt-dlp`     |
    /// | `FFMPEG_BIN` | `ffmpeg`     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "videos".into()));
        let static_dir =
            PathBuf::from(std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()));
        let index_file =
            PathBuf::from(std::env::var("INDEX_FILE").unwrap_or_else(|_| "index.html".into()));

        let yt_dlp_bin = std::env::var("YT_DLP_BIN").unwrap_or_else(|_| "yt-dlp".into());
        let ffmpeg_bin = std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".into());

        Self {
            host,
            port,
            data_dir,
            static_dir,
            index_file,
            yt_dlp_bin,
            ffmpeg_bin,
        }
    }
}
