//! Prometheus metrics for the daemon.
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`install_recorder`] has run, so services and tests can record freely.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// Fails if a recorder is already installed.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {e}"))
}

/// Record a listing served from (or missing) the result cache.
pub fn record_listing_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("galleryd_listing_cache_total", "result" => result).increment(1);
}

/// Record a directory scan.
pub fn record_scan(recursive: bool) {
    let mode = if recursive { "recursive" } else { "flat" };
    counter!("galleryd_scans_total", "mode" => mode).increment(1);
}

/// Record a thumbnail response by outcome
/// (`cached`, `generated`, `degraded`, `not_modified`).
pub fn record_thumbnail(outcome: &'static str) {
    counter!("galleryd_thumbnails_total", "outcome" => outcome).increment(1);
}

/// Record an event pushed on a change stream.
pub fn record_stream_event(kind: &'static str) {
    counter!("galleryd_stream_events_total", "kind" => kind).increment(1);
}

/// Record a rejected request by reason.
pub fn record_rejection(reason: &'static str) {
    counter!("galleryd_rejected_requests_total", "reason" => reason).increment(1);
}

/// Keeps the open-stream gauge incremented while alive.
#[derive(Debug)]
pub struct OpenStreamGuard(());

impl OpenStreamGuard {
    pub fn new() -> Self {
        gauge!("galleryd_open_streams").increment(1.0);
        Self(())
    }
}

impl Default for OpenStreamGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OpenStreamGuard {
    fn drop(&mut self) {
        gauge!("galleryd_open_streams").decrement(1.0);
    }
}
