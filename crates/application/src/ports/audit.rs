use super::transport::TransportProtocol;
use ferrous_resolver_domain::{Question, ResponseCode, ServerEndpoint};
use std::time::Duration;

/// One step of a query's audit trail. Events are emitted in order within a
/// single call; how they are rendered is up to the sink.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    QueryStarted {
        question: Question,
        servers: usize,
    },
    CacheHit {
        fingerprint: String,
        server: ServerEndpoint,
    },
    Attempt {
        server: ServerEndpoint,
        protocol: TransportProtocol,
        attempt: u32,
        xid: u16,
    },
    ResponseReceived {
        server: ServerEndpoint,
        rcode: ResponseCode,
        answers: usize,
        truncated: bool,
        latency: Duration,
    },
    AttemptFailed {
        server: ServerEndpoint,
        attempt: u32,
        message: String,
    },
    TcpFallback {
        reason: &'static str,
    },
}

/// Receives audit events. `record` must be non-blocking; sinks that buffer
/// or forward do so fire-and-forget.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}
