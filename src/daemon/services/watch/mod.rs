//! Poll-and-diff change notifications.
//!
//! Each stream re-runs a latest-modification probe over its subtree every
//! poll interval and yields a [`StreamMessage::Changed`] only when the value
//! strictly increases. Idle streams yield a keepalive once per keepalive
//! interval. The stream is a plain [`futures::Stream`]; dropping it (client
//! disconnect) ends polling and releases whatever guard was attached.

mod session;

use std::time::Duration;

use futures::Stream;
use futures::stream;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

pub use session::{StreamSession, StreamSignal, WatchTarget};

use super::gallery::GalleryService;
use crate::daemon::metrics;
use crate::error::Result;

/// Source of the latest modification time for a watched subtree.
///
/// Called on the blocking pool.
pub trait ModifiedProbe: Clone + Send + Sync + 'static {
    /// # Errors
    ///
    /// Any failure; streams treat it as "no change".
    fn latest_modified(&self, target: &WatchTarget) -> Result<f64>;
}

impl ModifiedProbe for GalleryService {
    fn latest_modified(&self, target: &WatchTarget) -> Result<f64> {
        self.latest_modified_blocking(
            target.source,
            &target.subfolder,
            target.recursive,
            target.show_hidden,
        )
    }
}

/// Poll and keepalive timing.
#[derive(Debug, Clone, Copy)]
pub struct StreamTiming {
    pub poll_interval: Duration,
    pub keepalive: Duration,
}

/// Body of a change event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePayload {
    pub subfolder: String,
    pub recursive: bool,
    pub modified_at: f64,
}

/// One item of a change stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Sent once when the stream opens.
    Opened,
    Changed(ChangePayload),
    Keepalive,
}

struct StreamState<P, G> {
    probe: P,
    target: WatchTarget,
    timing: StreamTiming,
    session: Option<StreamSession>,
    opened: bool,
    _guard: G,
}

/// Open a change stream over `target`.
///
/// `guard` lives exactly as long as the stream; use it to hold a connection
/// permit or an open-stream gauge.
pub fn watch<P, G>(
    probe: P,
    target: WatchTarget,
    timing: StreamTiming,
    guard: G,
) -> impl Stream<Item = StreamMessage> + Send + 'static
where
    P: ModifiedProbe,
    G: Send + 'static,
{
    let state = StreamState {
        probe,
        target,
        timing,
        session: None,
        opened: false,
        _guard: guard,
    };

    stream::unfold(state, |mut state| async move {
        if !state.opened {
            state.opened = true;
            return Some((StreamMessage::Opened, state));
        }

        let mut session = match state.session.take() {
            Some(session) => session,
            None => {
                let initial = probe_once(&state.probe, &state.target).await;
                debug!(
                    subfolder = %state.target.subfolder,
                    recursive = state.target.recursive,
                    ?initial,
                    "Change stream primed"
                );
                StreamSession::new(
                    state.target.clone(),
                    initial,
                    Instant::now(),
                    state.timing.keepalive,
                )
            },
        };

        loop {
            tokio::time::sleep(state.timing.poll_interval).await;
            let latest = probe_once(&state.probe, &state.target).await;

            let Some(signal) = session.tick(latest, Instant::now()) else {
                continue;
            };
            let message = match signal {
                StreamSignal::Changed(modified_at) => {
                    metrics::record_stream_event("changed");
                    StreamMessage::Changed(ChangePayload {
                        subfolder: session.target().subfolder.clone(),
                        recursive: session.target().recursive,
                        modified_at,
                    })
                },
                StreamSignal::Keepalive => {
                    metrics::record_stream_event("keepalive");
                    StreamMessage::Keepalive
                },
            };
            state.session = Some(session);
            return Some((message, state));
        }
    })
}

async fn probe_once<P: ModifiedProbe>(probe: &P, target: &WatchTarget) -> Option<f64> {
    let probe = probe.clone();
    let target = target.clone();
    match tokio::task::spawn_blocking(move || probe.latest_modified(&target)).await {
        Ok(Ok(latest)) => Some(latest),
        Ok(Err(e)) => {
            debug!(error = %e, "Change probe failed");
            None
        },
        Err(e) => {
            debug!(error = %e, "Change probe task failed");
            None
        },
    }
}
