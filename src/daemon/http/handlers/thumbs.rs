//! Thumbnail handler.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::super::types::{ThumbParams, parse_clamped, parse_source};
use super::super::{AppError, SharedState};
use super::query_params;
use crate::constants::THUMB_CACHE_CONTROL;
use crate::daemon::services::thumbs::ThumbnailResponse;

/// GET /api/thumb - JPEG thumbnail with weak-ETag revalidation.
pub(crate) async fn thumbnail(
    State(state): State<SharedState>,
    headers: HeaderMap,
    params: Result<Query<ThumbParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = query_params(params)?;
    let limits = &state.limits;

    let source = parse_source(params.source.as_deref())?;
    let filename = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("'filename' is required".to_string()))?;
    let width = parse_clamped(
        "w",
        params.w.as_deref(),
        i64::from(limits.default_width),
        i64::from(limits.min_width),
        i64::from(limits.max_width),
    )?;
    let width = u32::try_from(width).unwrap_or(limits.default_width);

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());

    let response = state
        .thumbs
        .get(
            source,
            params.subfolder.as_deref().unwrap_or_default(),
            &filename,
            width,
            if_none_match,
        )
        .await
        .map_err(|e| AppError::audited("thumb", e))?;

    let response = match response {
        ThumbnailResponse::NotModified { etag } => (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::CACHE_CONTROL, THUMB_CACHE_CONTROL.to_string()),
            ],
        )
            .into_response(),
        ThumbnailResponse::Fresh { bytes, etag, .. } => (
            [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (header::ETAG, etag),
                (header::CACHE_CONTROL, THUMB_CACHE_CONTROL.to_string()),
            ],
            bytes,
        )
            .into_response(),
    };
    Ok(response)
}
