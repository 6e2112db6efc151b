//! End-to-end orchestrator runs against stub yt-dlp/ffmpeg binaries.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use huebox_core::progress::ProgressUpdate;
use huebox_events::{ProgressBus, ProgressChannel, Subscription};
use huebox_pipeline::{topic_for, JobContext, Orchestrator, ToolConfig, MEDIA_FILE, PAGE_FILE};
use huebox_store::JobStore;

/// Write an executable shell script and return its path as a string.
fn stub(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// A yt-dlp stand-in: `-J` prints metadata with the given duration, any
/// other invocation writes a small file to the `-o` destination.
fn stub_yt_dlp(dir: &Path, duration: u32) -> String {
    stub(
        dir,
        "yt-dlp",
        &format!(
            r#"case "$1" in
  -J)
    echo '{{"duration": {duration}, "title": "Stubbed clip title", "webpage_url": "https://example.com/w"}}'
    ;;
  *)
    out=""
    while [ $# -gt 0 ]; do
      if [ "$1" = "-o" ]; then out="$2"; fi
      shift
    done
    printf 'media bytes' > "$out"
    ;;
esac"#
        ),
    )
}

/// An ffmpeg stand-in that "extracts" frames by copying pre-rendered
/// fixtures next to the output pattern (the second-to-last argument).
fn stub_ffmpeg(dir: &Path, fixtures: &Path) -> String {
    stub(
        dir,
        "ffmpeg",
        &format!(
            r#"prev=""; pat=""
for a in "$@"; do pat="$prev"; prev="$a"; done
cp {fixtures}/*.jpg "$(dirname "$pat")"/"#,
            fixtures = fixtures.display()
        ),
    )
}

/// Render `count` two-tone JPEG frames into `dir`.
fn write_frame_fixtures(dir: &Path, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for index in 0..count {
        let img = image::RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        });
        img.save(dir.join(format!("frame_{index:02}.jpg"))).unwrap();
    }
}

async fn next_event(sub: &mut Subscription) -> ProgressUpdate {
    tokio::time::timeout(Duration::from_secs(10), sub.recv())
        .await
        .expect("timed out waiting for progress event")
        .expect("progress channel closed early")
}

/// Collect events until (and including) the terminal one.
async fn collect_run(sub: &mut Subscription) -> Vec<ProgressUpdate> {
    let mut events = Vec::new();
    loop {
        let event = next_event(sub).await;
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

fn context(tmp: &Path, duration: u32, fixtures: Option<&Path>) -> Arc<JobContext> {
    let ffmpeg_bin = match fixtures {
        Some(fixtures) => stub_ffmpeg(tmp, fixtures),
        None => stub(tmp, "ffmpeg", "exit 0"),
    };
    Arc::new(JobContext {
        data_dir: tmp.join("videos"),
        tools: ToolConfig {
            yt_dlp_bin: stub_yt_dlp(tmp, duration),
            ffmpeg_bin,
        },
        channel: Arc::new(ProgressBus::new()),
    })
}

#[tokio::test]
async fn ten_second_source_runs_to_complete() {
    let tmp = tempfile::tempdir().unwrap();
    let fixtures = tmp.path().join("fixtures");
    write_frame_fixtures(&fixtures, 4);
    let ctx = context(tmp.path(), 10, Some(&fixtures));

    let mut sub = ctx.channel.subscribe(&topic_for("tester")).await;
    let orchestrator = Orchestrator::create(
        Arc::clone(&ctx),
        "https://example.com/x".to_string(),
        "360p".to_string(),
        "tester",
    )
    .await
    .unwrap();
    let job_id = orchestrator.spawn();

    let events = collect_run(&mut sub).await;

    // State-machine order with a monotone progress sequence.
    let progress: Vec<u8> = events.iter().map(|e| e.progress()).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(events[0], ProgressUpdate::FetchingMetadata);
    assert_eq!(
        events.last().unwrap(),
        &ProgressUpdate::Complete {
            job_id: job_id.clone(),
            video_url: format!("/v/{job_id}"),
        }
    );
    // Entry checkpoint 40, then one update per frame up to 90.
    assert!(events.contains(&ProgressUpdate::Analyzing { completed: 0, total: 4 }));
    assert!(events.contains(&ProgressUpdate::Analyzing { completed: 4, total: 4 }));

    // One record per frame, page rendered, raw media removed.
    let folder = ctx.data_dir.join(&job_id);
    let store = JobStore::load(&folder).await.unwrap();
    assert_eq!(store.details().len(), 1);
    assert_eq!(store.details()[0].length_seconds, 10);
    assert_eq!(store.frames().len(), 4);
    assert!(store.frames().iter().all(|f| f.analysis.len() == 2));

    let html = std::fs::read_to_string(folder.join(PAGE_FILE)).unwrap();
    for index in 0..4 {
        assert!(html.contains(&format!("frame_{index:02}.jpg")));
    }
    assert!(html.contains("repeat(4, 1fr)"));
    assert!(!folder.join(MEDIA_FILE).exists());
}

#[tokio::test]
async fn overlong_duration_rejected_before_download() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = context(tmp.path(), 75, None);

    let mut sub = ctx.channel.subscribe(&topic_for("tester")).await;
    let orchestrator = Orchestrator::create(
        Arc::clone(&ctx),
        "https://example.com/x".to_string(),
        "360p".to_string(),
        "tester",
    )
    .await
    .unwrap();
    let job_id = orchestrator.spawn();

    let events = collect_run(&mut sub).await;
    assert_eq!(events[0], ProgressUpdate::FetchingMetadata);
    let terminal = events.last().unwrap();
    match terminal {
        ProgressUpdate::Error { message } => {
            assert!(message.starts_with("Invalid or unsupported video duration"));
        }
        other => panic!("expected error event, got {other:?}"),
    }
    assert_eq!(terminal.progress(), 100);

    // No download happened; the folder holds only the empty store.
    let folder = ctx.data_dir.join(&job_id);
    assert!(!folder.join(MEDIA_FILE).exists());
    let store = JobStore::load(&folder).await.unwrap();
    assert!(store.details().is_empty());
    assert!(store.frames().is_empty());
}

#[tokio::test]
async fn failing_download_surfaces_tool_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    // Metadata resolves fine, the download exits non-zero.
    let yt_dlp = stub(
        tmp.path(),
        "yt-dlp",
        r#"case "$1" in
  -J) echo '{"duration": 10, "title": "t", "webpage_url": "https://example.com/w"}' ;;
  *) echo 'no formats found' >&2; exit 1 ;;
esac"#,
    );
    let ctx = Arc::new(JobContext {
        data_dir: tmp.path().join("videos"),
        tools: ToolConfig {
            yt_dlp_bin: yt_dlp,
            ffmpeg_bin: stub(tmp.path(), "ffmpeg", "exit 0"),
        },
        channel: Arc::new(ProgressBus::new()),
    });

    let mut sub = ctx.channel.subscribe(&topic_for("tester")).await;
    Orchestrator::create(
        Arc::clone(&ctx),
        "https://example.com/x".to_string(),
        "360p".to_string(),
        "tester",
    )
    .await
    .unwrap()
    .spawn();

    let events = collect_run(&mut sub).await;
    match events.last().unwrap() {
        ProgressUpdate::Error { message } => {
            assert!(message.contains("exited with code 1"), "{message}");
            assert!(message.contains("no formats found"), "{message}");
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn two_subscribers_receive_identical_sequences() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = context(tmp.path(), 75, None);

    let mut first = ctx.channel.subscribe(&topic_for("tester")).await;
    let mut second = ctx.channel.subscribe(&topic_for("tester")).await;
    Orchestrator::create(
        Arc::clone(&ctx),
        "https://example.com/x".to_string(),
        "360p".to_string(),
        "tester",
    )
    .await
    .unwrap()
    .spawn();

    let seen_first = collect_run(&mut first).await;
    let seen_second = collect_run(&mut second).await;
    assert_eq!(seen_first, seen_second);
}
