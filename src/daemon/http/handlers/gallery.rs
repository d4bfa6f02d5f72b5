//! Listing handler.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use super::super::types::{
    GalleryParams, parse_bool, parse_clamped, parse_kind, parse_page, parse_source,
};
use super::super::{AppError, SharedState};
use super::query_params;
use crate::daemon::services::gallery::ListingResult;

/// GET /api/gallery - One page of a (possibly recursive) listing.
pub(crate) async fn gallery_list(
    State(state): State<SharedState>,
    params: Result<Query<GalleryParams>, QueryRejection>,
) -> Result<Json<Arc<ListingResult>>, AppError> {
    let params = query_params(params)?;
    let limits = &state.limits;

    let source = parse_source(params.source.as_deref())?;
    let page = parse_page(params.page.as_deref())?;
    let page_size = parse_clamped(
        "per_page",
        params.per_page.as_deref(),
        i64::try_from(limits.default_page_size).unwrap_or(i64::MAX),
        0,
        i64::try_from(limits.max_page_size).unwrap_or(i64::MAX),
    )?;

    let mut query = state
        .gallery
        .query(source, params.subfolder.as_deref().unwrap_or_default());
    query.page = page;
    query.page_size = usize::try_from(page_size).unwrap_or(0);
    query.recursive = parse_bool("recursive", params.recursive.as_deref(), false)?;
    query.show_hidden = parse_bool("show_hidden", params.show_hidden.as_deref(), false)?;
    query.include_meta = parse_bool("include_meta", params.include_meta.as_deref(), false)?;
    query.kind = parse_kind(params.kind.as_deref())?;
    query.cache_bust = params.cache_bust.filter(|token| !token.is_empty());

    let result = state
        .gallery
        .list(query)
        .await
        .map_err(|e| AppError::audited("gallery", e))?;
    Ok(Json(result))
}
