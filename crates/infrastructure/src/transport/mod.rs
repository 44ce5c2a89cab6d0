//! Default transport adapters: UDP datagrams and TCP with the 2-byte
//! length prefix.

mod tcp;
mod udp;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::future::Future;
use std::time::Duration;

/// Largest message the stream framing can carry.
pub(crate) const MAX_TCP_MESSAGE_SIZE: usize = 65_535;

/// Runs `operation` under the per-invocation deadline; `None` means no
/// deadline at all.
pub(crate) async fn with_deadline<F, T>(
    timeout: Option<Duration>,
    server: ServerEndpoint,
    operation: F,
) -> Result<T, ResolveError>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, operation)
            .await
            .map_err(|_| ResolveError::Timeout { server }),
        None => Ok(operation.await),
    }
}

/// Classifies a socket error: connection-level refusals and resets are
/// transient (worth a retry or the next server), anything else is an
/// unexpected connection failure.
pub(crate) fn map_io_error(server: ServerEndpoint, error: std::io::Error) -> ResolveError {
    use std::io::ErrorKind;
    match error.kind() {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof
        | ErrorKind::WouldBlock
        | ErrorKind::Interrupted => ResolveError::TransientIo {
            server,
            message: error.to_string(),
        },
        ErrorKind::TimedOut => ResolveError::Timeout { server },
        _ => ResolveError::ConnectionFailure {
            server,
            message: error.to_string(),
        },
    }
}
