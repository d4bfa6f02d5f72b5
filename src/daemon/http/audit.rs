//! Security audit logging for HTTP daemon events.
//!
//! Path-escape attempts and refused stream connections are logged under the
//! `audit` target so they can be routed separately from request tracing.

use tracing::{info, warn};

/// Security-relevant events worth monitoring.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A client path resolved outside its root.
    PathTraversalBlocked {
        endpoint: &'static str,
        path: String,
    },
    /// A change stream was refused because the connection cap was reached.
    StreamRejected { subfolder: String, limit: usize },
}

/// Log a security audit event with structured fields.
pub fn log_audit_event(event: AuditEvent) {
    match event {
        AuditEvent::PathTraversalBlocked { endpoint, path } => {
            warn!(
                target: "audit",
                event_type = "path_traversal_blocked",
                endpoint,
                %path,
                "Path traversal attempt blocked"
            );
        },
        AuditEvent::StreamRejected { subfolder, limit } => {
            info!(
                target: "audit",
                event_type = "stream_rejected",
                %subfolder,
                limit,
                "Change stream refused at connection cap"
            );
        },
    }
}
