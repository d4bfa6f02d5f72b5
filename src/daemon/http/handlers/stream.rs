//! Change-stream handler.
//!
//! Path checks run before the stream opens so clients get a plain `403` or
//! `404` instead of an event stream that ends immediately.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{
        IntoResponse,
        sse::{Event, Sse},
    },
};
use futures::StreamExt;
use tracing::{debug, warn};

use super::super::types::{StreamParams, parse_bool, parse_source};
use super::super::{AppError, AuditEvent, SharedState, log_audit_event, metrics};
use super::query_params;
use crate::daemon::metrics::OpenStreamGuard;
use crate::daemon::services::watch::{StreamMessage, WatchTarget, watch};
use crate::error::Error;

/// GET /api/gallery/stream - Server-sent change notifications.
pub(crate) async fn gallery_stream(
    State(state): State<SharedState>,
    params: Result<Query<StreamParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let params = query_params(params)?;
    let source = parse_source(params.source.as_deref())?;
    let recursive = parse_bool("recursive", params.recursive.as_deref(), false)?;
    let show_hidden = parse_bool("show_hidden", params.show_hidden.as_deref(), false)?;
    let raw_subfolder = params.subfolder.unwrap_or_default();

    let gallery = state.gallery.clone();
    let checked = raw_subfolder.clone();
    let subfolder = tokio::task::spawn_blocking(move || gallery.check_dir(source, &checked))
        .await
        .map_err(Error::from)?
        .map_err(|e| AppError::audited("stream", e))?;

    let permit = Arc::clone(&state.streams).try_acquire_owned().map_err(|_| {
        log_audit_event(AuditEvent::StreamRejected {
            subfolder: raw_subfolder.clone(),
            limit: state.limits.max_streams,
        });
        metrics::record_rejection("stream_cap");
        AppError::ServiceUnavailable(format!(
            "Too many open change streams (limit {})",
            state.limits.max_streams
        ))
    })?;

    debug!(%subfolder, recursive, "Change stream opened");
    let target = WatchTarget {
        source,
        subfolder,
        recursive,
        show_hidden,
    };
    let messages = watch(
        state.gallery.clone(),
        target,
        state.timing,
        (permit, OpenStreamGuard::new()),
    );
    let events = messages.map(|message| Ok::<_, Infallible>(to_event(message)));

    Ok(([("x-accel-buffering", "no")], Sse::new(events)))
}

fn to_event(message: StreamMessage) -> Event {
    match message {
        StreamMessage::Opened => Event::default().comment("stream opened"),
        StreamMessage::Keepalive => Event::default().comment("keepalive"),
        StreamMessage::Changed(payload) => Event::default().json_data(&payload).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize change event");
            Event::default().comment("keepalive")
        }),
    }
}
