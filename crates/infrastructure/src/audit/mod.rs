//! Audit sinks. Emission is always fire-and-forget; a slow consumer never
//! stalls a query.

use ferrous_resolver_application::ports::{AuditEvent, AuditSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Discards every event. The default when the audit trail is disabled.
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn record(&self, _event: AuditEvent) {}
}

/// Forwards events over an unbounded channel to whoever holds the receiver.
pub struct ChannelAudit {
    sender: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAudit {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<AuditEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

impl AuditSink for ChannelAudit {
    fn record(&self, event: AuditEvent) {
        let _ = self.sender.send(event);
    }
}

/// Bridges events into the tracing subscriber for log-only consumers.
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: AuditEvent) {
        match event {
            AuditEvent::QueryStarted { question, servers } => {
                debug!(%question, servers, "query started");
            }
            AuditEvent::CacheHit {
                fingerprint,
                server,
            } => {
                debug!(%fingerprint, %server, "cache hit");
            }
            AuditEvent::Attempt {
                server,
                protocol,
                attempt,
                xid,
            } => {
                debug!(%server, protocol = protocol.as_str(), attempt, xid, "sending query");
            }
            AuditEvent::ResponseReceived {
                server,
                rcode,
                answers,
                truncated,
                latency,
            } => {
                debug!(
                    %server,
                    rcode = %rcode,
                    answers,
                    truncated,
                    latency_ms = latency.as_millis() as u64,
                    "response received"
                );
            }
            AuditEvent::AttemptFailed {
                server,
                attempt,
                message,
            } => {
                debug!(%server, attempt, %message, "attempt failed");
            }
            AuditEvent::TcpFallback { reason } => {
                debug!(reason, "switching to TCP");
            }
        }
    }
}
