//! HTTP API handlers organized by service.

pub mod gallery;
pub mod health;
pub mod stream;
pub mod thumbs;

// Re-export all handlers for use in routing
pub(crate) use gallery::gallery_list;
pub(crate) use health::{health, metrics};
pub(crate) use stream::gallery_stream;
pub(crate) use thumbs::thumbnail;

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;

use super::AppError;

/// Unwrap query parameters, turning extractor rejections into JSON `400`s.
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(inner)| inner)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}
