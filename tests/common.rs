//! Shared helpers for HTTP integration tests.
//!
//! [`TestGallery`] builds the real router over temporary media roots and
//! drives it in-process with `tower::ServiceExt::oneshot`, so no socket is
//! bound.

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use tempfile::TempDir;
use tower::ServiceExt;

use galleryd::config::GalleryConfig;
use galleryd::daemon::http::{AppState, router};

/// Baseline mtime for fixtures (2023-11-14).
pub const T0: u64 = 1_700_000_000;

/// Builder for [`TestGallery`].
pub struct TestGalleryBuilder {
    max_streams: usize,
    poll_interval_ms: u64,
    keepalive_secs: u64,
}

impl TestGalleryBuilder {
    pub fn max_streams(mut self, max: usize) -> Self {
        self.max_streams = max;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn keepalive_secs(mut self, secs: u64) -> Self {
        self.keepalive_secs = secs;
        self
    }

    pub fn start(self) -> TestGallery {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = GalleryConfig::default();
        config.gallery.output_dir = Some(dir.path().join("output"));
        config.gallery.input_dir = Some(dir.path().join("input"));
        config.thumbnails.dir = Some(dir.path().join("thumbs"));
        config.thumbnails.ffmpeg = dir.path().join("no-ffmpeg-here");
        config.stream.max_connections = self.max_streams;
        config.stream.poll_interval_ms = self.poll_interval_ms;
        config.stream.keepalive_secs = self.keepalive_secs;

        let state = AppState::from_config(&config, None).expect("Failed to build state");
        let output = state
            .gallery
            .roots()
            .root(galleryd::daemon::services::gallery::SourceKind::Output)
            .to_path_buf();
        let input = state
            .gallery
            .roots()
            .root(galleryd::daemon::services::gallery::SourceKind::Input)
            .to_path_buf();

        TestGallery {
            router: router(Arc::new(state)),
            output,
            input,
            thumbs: dir.path().join("thumbs"),
            _dir: dir,
        }
    }
}

/// An in-process gallery daemon over temporary roots.
pub struct TestGallery {
    _dir: TempDir,
    pub router: Router,
    pub output: PathBuf,
    pub input: PathBuf,
    pub thumbs: PathBuf,
}

impl TestGallery {
    pub fn builder() -> TestGalleryBuilder {
        TestGalleryBuilder {
            max_streams: 64,
            poll_interval_ms: 25,
            keepalive_secs: 15,
        }
    }

    pub fn start() -> Self {
        Self::builder().start()
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.get_with(uri, &[]).await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
        let mut request = Request::get(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).expect("Invalid request"))
            .await
            .expect("Router is infallible")
    }

    /// Write a small non-image file under the output root with a fixed mtime.
    pub fn file(&self, relative: &str, mtime: u64) -> PathBuf {
        let path = self.output.join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
        fs::write(&path, b"data").unwrap();
        set_mtime(&path, mtime);
        path
    }

    /// Write a real PNG under `root` with a fixed mtime.
    pub fn image_in(&self, root: &Path, relative: &str, width: u32, height: u32, mtime: u64) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("image has a parent")).unwrap();
        image::RgbImage::new(width, height).save(&path).unwrap();
        set_mtime(&path, mtime);
    }

    /// Write a real PNG under the output root.
    pub fn image(&self, relative: &str, width: u32, height: u32, mtime: u64) {
        self.image_in(&self.output.clone(), relative, width, height, mtime);
    }
}

pub fn set_mtime(path: &Path, mtime: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
        .unwrap();
}

/// Collect a response body as JSON.
pub async fn json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Collect a response body as bytes.
pub async fn bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

/// Relative paths of the `items` in a listing body.
pub fn item_paths(body: &serde_json::Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("items is an array")
        .iter()
        .map(|item| item["relative_path"].as_str().unwrap_or_default().to_string())
        .collect()
}
