//! Static result page rendering.
//!
//! The page is pure output: one grid cell per analyzed frame, each cell
//! a vertical color-bar stack (one bar per cluster, height equal to the
//! cluster's percentage, in the analyzer's HSL order) above the frame's
//! still image. It is written atomically, so a concurrent reader sees
//! either no page or a complete one — never a partial render.

use std::path::Path;

use tokio::io::AsyncWriteExt;

use huebox_core::error::StageError;
use huebox_core::types::{FrameRecord, JobDetails};

/// Final page filename inside the job folder.
pub const PAGE_FILE: &str = "video.html";

/// Frames with fewer clusters than this are silently skipped.
const MIN_CLUSTERS: usize = 2;

/// Render `video.html` for a finished job.
pub async fn build_page(
    folder: &Path,
    source_url: &str,
    details: &[JobDetails],
    frames: &[FrameRecord],
) -> Result<(), StageError> {
    let html = render(folder, source_url, details, frames);

    let tmp = folder.join(format!("{PAGE_FILE}.tmp"));
    let final_path = folder.join(PAGE_FILE);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(html.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, &final_path).await?;

    tracing::info!(page = %final_path.display(), "Wrote result page");
    Ok(())
}

fn render(folder: &Path, source_url: &str, details: &[JobDetails], frames: &[FrameRecord]) -> String {
    let name = details.first().map(|d| d.name.as_str()).unwrap_or("Video ?!");
    let url = details.first().map(|d| d.url.as_str()).unwrap_or(source_url);
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut cells = Vec::new();
    for frame in frames {
        if frame.analysis.len() < MIN_CLUSTERS {
            continue;
        }
        let img_src = format!("/videos/{folder_name}/{}", frame.frame_name);
        let bars: String = frame
            .analysis
            .iter()
            .map(|c| {
                format!(
                    "<div style=\"background-color: rgb({}, {}, {}); height: {}%\"></div>",
                    c.color_rgb[0], c.color_rgb[1], c.color_rgb[2], c.percentage
                )
            })
            .collect();
        cells.push(format!(
            "<div class=\"cell\"><div class=\"bars\">{bars}</div><img src=\"{img_src}\" alt=\"{}\"></div>",
            escape(name)
        ));
    }

    let columns = cells.len().max(1);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="/static/css/site.css">
</head>
<body>
<h1><a href="{url}">{title}</a></h1>
<article>
<div class="frames" style="display: grid; grid-template-columns: repeat({columns}, 1fr)">
{cells}
</div>
</article>
</body>
</html>
"#,
        title = escape(name),
        url = escape(url),
        columns = columns,
        cells = cells.join("\n"),
    )
}

/// Minimal HTML escaping for titles and URLs that end up in markup.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
