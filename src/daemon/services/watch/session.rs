//! Per-connection change tracking.

use std::time::Duration;

use tokio::time::Instant;

use crate::daemon::services::gallery::SourceKind;

/// The subtree a stream watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub source: SourceKind,
    /// Normalized forward-slash subfolder.
    pub subfolder: String,
    pub recursive: bool,
    pub show_hidden: bool,
}

/// What a poll tick asks the connection to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamSignal {
    /// The latest modification time strictly increased to this value.
    Changed(f64),
    /// Nothing changed for a full keepalive interval.
    Keepalive,
}

/// Last observed state of one stream.
#[derive(Debug)]
pub struct StreamSession {
    target: WatchTarget,
    /// `None` until a probe has succeeded.
    last_seen: Option<f64>,
    next_keepalive_at: Instant,
    keepalive: Duration,
}

impl StreamSession {
    /// Start tracking from `initial`, with the first keepalive due one
    /// interval after `now`.
    ///
    /// A `None` baseline (the opening probe failed) is filled in by the first
    /// successful tick without emitting a change.
    pub fn new(
        target: WatchTarget,
        initial: Option<f64>,
        now: Instant,
        keepalive: Duration,
    ) -> Self {
        Self {
            target,
            last_seen: initial,
            next_keepalive_at: now + keepalive,
            keepalive,
        }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn last_seen(&self) -> Option<f64> {
        self.last_seen
    }

    /// Fold one probe result into the session.
    ///
    /// `None` is a failed probe and counts as no change. Either emitted
    /// signal resets the keepalive deadline.
    pub fn tick(&mut self, probe: Option<f64>, now: Instant) -> Option<StreamSignal> {
        match (probe, self.last_seen) {
            (Some(latest), None) => self.last_seen = Some(latest),
            (Some(latest), Some(seen)) if latest > seen => {
                self.last_seen = Some(latest);
                self.next_keepalive_at = now + self.keepalive;
                return Some(StreamSignal::Changed(latest));
            },
            _ => {},
        }

        if now >= self.next_keepalive_at {
            self.next_keepalive_at = now + self.keepalive;
            return Some(StreamSignal::Keepalive);
        }
        None
    }
}
