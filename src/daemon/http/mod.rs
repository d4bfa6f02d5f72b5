//! HTTP API for the gallery daemon.
//!
//! Routes:
//! - `GET /api/gallery` - paginated listing
//! - `GET /api/gallery/stream` - server-sent change notifications
//! - `GET /api/thumb` - cached JPEG thumbnails
//! - `GET /health` - liveness
//! - `GET /metrics` - Prometheus exposition

mod audit;
mod handlers;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

pub use audit::{AuditEvent, log_audit_event};

use super::metrics;
use super::services::gallery::GalleryService;
use super::services::roots::MediaRoots;
use super::services::thumbs::{MediaThumbnailer, ThumbnailService};
use super::services::watch::StreamTiming;
use crate::config::GalleryConfig;
use crate::error::Error;
use types::ErrorResponse;

/// Request limits and defaults applied by the handlers.
#[derive(Debug, Clone)]
pub struct Limits {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub min_width: u32,
    pub max_width: u32,
    pub default_width: u32,
    pub max_streams: usize,
}

/// Everything the handlers share.
pub struct AppState {
    pub gallery: GalleryService,
    pub thumbs: ThumbnailService,
    pub limits: Limits,
    pub timing: StreamTiming,
    /// One permit per open change stream.
    pub streams: Arc<Semaphore>,
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build services from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a root or the thumbnail directory cannot be
    /// created.
    pub fn from_config(
        config: &GalleryConfig,
        metrics: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let roots = MediaRoots::open(config.input_dir()?, config.output_dir()?)
            .context("Failed to prepare media roots")?;
        let gallery = GalleryService::new(
            roots.clone(),
            config.cache_ttl(),
            config.gallery.cache_capacity,
        );

        let thumbnailer = MediaThumbnailer::new(
            config.thumbnails.ffmpeg.clone(),
            config.thumbnails.video_offset_secs,
        );
        let thumbs = ThumbnailService::open(
            roots,
            config.thumbs_dir()?,
            Arc::new(thumbnailer),
            config.thumbnails.max_concurrent,
        )?;

        Ok(Self {
            gallery,
            thumbs,
            limits: Limits {
                default_page_size: config.gallery.default_page_size,
                max_page_size: config.gallery.max_page_size,
                min_width: config.thumbnails.min_width,
                max_width: config.thumbnails.max_width,
                default_width: config.thumbnails.default_width,
                max_streams: config.stream.max_connections,
            },
            timing: StreamTiming {
                poll_interval: config.poll_interval(),
                keepalive: config.keepalive(),
            },
            streams: Arc::new(Semaphore::new(config.stream.max_connections)),
            metrics,
        })
    }
}

/// Build the API router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/gallery", get(handlers::gallery_list))
        .route("/api/gallery/stream", get(handlers::gallery_stream))
        .route("/api/thumb", get(handlers::thumbnail))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// Error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            },
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        }
    }

    /// Convert a domain error, auditing path escapes against `endpoint`.
    pub(crate) fn audited(endpoint: &'static str, err: Error) -> Self {
        if let Error::PathForbidden { path } = &err {
            log_audit_event(AuditEvent::PathTraversalBlocked {
                endpoint,
                path: path.clone(),
            });
            metrics::record_rejection("forbidden");
        }
        err.into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(reason, %message, "Request failed");
        }
        let body = ErrorResponse {
            error: reason.to_string(),
            message: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRequest(msg) => Self::BadRequest(msg),
            Error::PathForbidden { path } => {
                Self::Forbidden(format!("Path escapes its root: {path}"))
            },
            Error::NotFound { what } => Self::NotFound(format!("Not found: {what}")),
            other => Self::Internal(other.to_string()),
        }
    }
}
