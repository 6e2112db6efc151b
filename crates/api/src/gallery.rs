//! Gallery snapshot: previously completed jobs, derived by scanning the
//! persisted job folders.
//!
//! Rendered once per status stream, before live events start flowing.
//! Folders without a readable store (in-flight or broken jobs) are
//! silently skipped.

use std::path::Path;

use huebox_store::JobStore;

/// Render the gallery fragment for all job folders under `data_dir`.
pub async fn render(data_dir: &Path) -> String {
    let mut items = Vec::new();

    let mut folders = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(data_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            folders.push(entry.path());
        }
    }
    folders.sort();

    for folder in folders {
        let Ok(store) = JobStore::load(&folder).await else {
            continue;
        };
        let Some(details) = store.details().first() else {
            continue;
        };
        let Some(id) = folder.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let name = escape(&details.name);
        items.push(format!(
            "<a href='/v/{id}' class='gc'><img src='/videos/{id}/frame_00.jpg' alt='{name}'><span>{name}</span></a>"
        ));
    }

    format!("<div id='gallery'>{}</div>", items.concat())
}

/// Minimal HTML escaping for titles that end up in markup.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
