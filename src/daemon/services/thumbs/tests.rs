//! Thumbnail service tests.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use anyhow::bail;
use image::RgbImage;
use tempfile::TempDir;

use super::*;
use crate::error::Error;

/// Records calls and delegates to the real thumbnailer.
#[derive(Default)]
struct CountingThumbnailer {
    calls: AtomicUsize,
    inner: MediaThumbnailer,
}

impl Thumbnailer for CountingThumbnailer {
    fn render(&self, source: &Path, width: u32) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source, width)
    }
}

struct FailingThumbnailer;

impl Thumbnailer for FailingThumbnailer {
    fn render(&self, _source: &Path, _width: u32) -> anyhow::Result<Vec<u8>> {
        bail!("decoder exploded")
    }
}

struct Fixture {
    dir: TempDir,
    roots: MediaRoots,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let roots = MediaRoots::open(dir.path().join("input"), dir.path().join("output")).unwrap();
        Self { dir, roots }
    }

    fn service(&self, thumbnailer: Arc<dyn Thumbnailer>) -> ThumbnailService {
        ThumbnailService::open(self.roots.clone(), self.dir.path().join("thumbs"), thumbnailer, 2)
            .unwrap()
    }

    fn image(&self, relative: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = self.roots.root(SourceKind::Output).join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::new(width, height).save(&path).unwrap();
        path
    }
}

fn fresh(response: ThumbnailResponse) -> (Vec<u8>, String, ThumbnailOutcome) {
    match response {
        ThumbnailResponse::Fresh {
            bytes,
            etag,
            outcome,
        } => (bytes, etag, outcome),
        ThumbnailResponse::NotModified { .. } => panic!("expected a fresh thumbnail"),
    }
}

#[tokio::test]
async fn test_generates_then_reuses_artifact() {
    let fx = Fixture::new();
    fx.image("renders/cat.png", 800, 600);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    let first = service
        .get(SourceKind::Output, "renders", "cat.png", 200, None)
        .await
        .unwrap();
    let (bytes, etag, outcome) = fresh(first);
    assert_eq!(outcome, ThumbnailOutcome::Generated);
    let thumb = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (200, 150));

    let artifact = fx.dir.path().join("thumbs/output/renders/cat__w200.jpg");
    assert!(artifact.is_file());

    let second = service
        .get(SourceKind::Output, "renders", "cat.png", 200, None)
        .await
        .unwrap();
    let (again, etag_again, outcome) = fresh(second);
    assert_eq!(outcome, ThumbnailOutcome::Cached);
    assert_eq!(again, bytes);
    assert_eq!(etag_again, etag);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_if_none_match_short_circuits() {
    let fx = Fixture::new();
    fx.image("cat.png", 64, 64);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    let (_, etag, _) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );

    let response = service
        .get(SourceKind::Output, "", "cat.png", 128, Some(&etag))
        .await
        .unwrap();
    assert!(matches!(response, ThumbnailResponse::NotModified { etag: e } if e == etag));
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validator_never_touches_destination() {
    let fx = Fixture::new();
    let source = fx.image("cat.png", 64, 64);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    let etag = etag_for(&fs::metadata(&source).unwrap(), 256);
    let response = service
        .get(SourceKind::Output, "", "cat.png", 256, Some(&etag))
        .await
        .unwrap();
    assert!(matches!(response, ThumbnailResponse::NotModified { .. }));
    assert!(!fx.dir.path().join("thumbs/output/cat__w256.jpg").exists());
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_touching_source_regenerates() {
    let fx = Fixture::new();
    let source = fx.image("cat.png", 64, 64);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    let (_, before, _) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );

    File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();

    let (_, after, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Generated);
    assert_ne!(before, after);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 2);

    let (_, _, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Cached);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_widths_are_cached_separately() {
    let fx = Fixture::new();
    fx.image("cat.png", 500, 500);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    service
        .get(SourceKind::Output, "", "cat.png", 128, None)
        .await
        .unwrap();
    service
        .get(SourceKind::Output, "", "cat.png", 256, None)
        .await
        .unwrap();
    assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_corrupt_artifact_is_replaced() {
    let fx = Fixture::new();
    fx.image("cat.png", 64, 64);
    let spy = Arc::new(CountingThumbnailer::default());
    let service = fx.service(spy.clone());

    service
        .get(SourceKind::Output, "", "cat.png", 128, None)
        .await
        .unwrap();
    let artifact = fx.dir.path().join("thumbs/output/cat__w128.jpg");
    fs::write(&artifact, b"").unwrap();

    let (_, _, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Generated);
    assert!(fs::metadata(&artifact).unwrap().len() > 0);
}

#[tokio::test]
async fn test_video_without_decoder_degrades_to_placeholder() {
    let fx = Fixture::new();
    let clip = fx.roots.root(SourceKind::Output).join("clip.mp4");
    fs::write(&clip, b"not really a video").unwrap();

    let thumbnailer = MediaThumbnailer::new(fx.dir.path().join("missing-ffmpeg"), 0.1);
    let service = fx.service(Arc::new(thumbnailer));

    let (bytes, _, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "clip.mp4", 320, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Degraded);
    let thumb = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (320, 180));

    // The placeholder is cached like any other artifact.
    let (_, _, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "clip.mp4", 320, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Cached);
}

#[tokio::test]
async fn test_render_failure_never_errors() {
    let fx = Fixture::new();
    fx.image("cat.png", 64, 64);
    let service = fx.service(Arc::new(FailingThumbnailer));

    let (_, _, outcome) = fresh(
        service
            .get(SourceKind::Output, "", "cat.png", 128, None)
            .await
            .unwrap(),
    );
    assert_eq!(outcome, ThumbnailOutcome::Degraded);
}

#[tokio::test]
async fn test_no_temporary_files_left_behind() {
    let fx = Fixture::new();
    fx.image("cat.png", 64, 64);
    let service = fx.service(Arc::new(MediaThumbnailer::default()));
    service
        .get(SourceKind::Output, "", "cat.png", 128, None)
        .await
        .unwrap();

    let names: Vec<String> = fs::read_dir(fx.dir.path().join("thumbs/output"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["cat__w128.jpg"]);
}

#[tokio::test]
async fn test_escape_is_forbidden() {
    let fx = Fixture::new();
    let service = fx.service(Arc::new(MediaThumbnailer::default()));

    for (subfolder, filename) in [("../../etc", "passwd"), ("", "../secret.png")] {
        let err = service
            .get(SourceKind::Output, subfolder, filename, 128, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathForbidden { .. }), "{subfolder}/{filename}");
    }
}

#[tokio::test]
async fn test_missing_source_is_not_found() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.roots.root(SourceKind::Output).join("folder")).unwrap();
    let service = fx.service(Arc::new(MediaThumbnailer::default()));

    let err = service
        .get(SourceKind::Output, "", "ghost.png", 128, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = service
        .get(SourceKind::Output, "", "folder", 128, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_missing_file_behind_escaping_symlink_is_forbidden() {
    use std::os::unix::fs::symlink;

    let fx = Fixture::new();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.png"), b"secret").unwrap();
    symlink(outside.path(), fx.roots.root(SourceKind::Output).join("evil")).unwrap();
    let service = fx.service(Arc::new(MediaThumbnailer::default()));

    for filename in ["secret.png", "nosuch.png"] {
        let err = service
            .get(SourceKind::Output, "evil", filename, 128, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PathForbidden { .. }), "{filename}: {err}");
    }
}

#[tokio::test]
async fn test_not_found_reports_relative_path() {
    let fx = Fixture::new();
    let service = fx.service(Arc::new(MediaThumbnailer::default()));

    let err = service
        .get(SourceKind::Output, "renders", "ghost.png", 128, None)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("renders/ghost.png"), "{message}");
    assert!(
        !message.contains(&*fx.dir.path().to_string_lossy()),
        "server path leaked: {message}"
    );
}
