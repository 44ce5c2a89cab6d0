use async_trait::async_trait;
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Udp,
    Tcp,
}

impl TransportProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportProtocol::Udp => "UDP",
            TransportProtocol::Tcp => "TCP",
        }
    }
}

#[derive(Debug)]
pub struct TransportReply {
    pub bytes: Vec<u8>,
    pub protocol: TransportProtocol,
}

/// One transport handle type (UDP or TCP). Implementations are re-entrant;
/// the engine never holds a lock across an exchange.
///
/// `timeout` is the per-invocation deadline (`None` means no deadline) and
/// must be reported as [`ResolveError::Timeout`]. Transient socket failures
/// map to [`ResolveError::TransientIo`]; anything unexpected to
/// [`ResolveError::ConnectionFailure`].
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn exchange(
        &self,
        server: ServerEndpoint,
        payload: &[u8],
        timeout: Option<Duration>,
        max_response_size: usize,
    ) -> Result<TransportReply, ResolveError>;

    fn protocol(&self) -> TransportProtocol;
}
