use crate::response_code::ResponseCode;
use crate::server::ServerEndpoint;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while resolving a question.
///
/// The engine's retry policy branches on these kinds, so transport and codec
/// adapters must map their failures onto the matching variant instead of
/// collapsing everything into strings.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("no name servers available to query")]
    EmptyServers,

    #[error("query timed out against {server}")]
    Timeout { server: ServerEndpoint },

    #[error("transient I/O failure against {server}: {message}")]
    TransientIo {
        server: ServerEndpoint,
        message: String,
    },

    #[error("query was cancelled")]
    Cancelled,

    #[error("response id {actual:#06x} does not match request id {expected:#06x}")]
    XidMismatch { expected: u16, actual: u16 },

    #[error("response was truncated")]
    Truncated,

    #[error("response was truncated and TCP fallback is disabled")]
    TruncatedFallbackDisabled,

    #[error("server returned a truncated response over TCP")]
    UnexpectedTruncatedOverTcp,

    #[error("malformed response message of {data_length} bytes (overrun: {overrun})")]
    Malformed {
        /// Size of the datagram or stream message that failed to decode.
        data_length: usize,
        /// The decoder ran past the available data, which on UDP usually
        /// means the datagram was cut off in transit.
        overrun: bool,
    },

    #[error("server returned {rcode}")]
    Dns { rcode: ResponseCode },

    #[error("connection to {server} failed: {message}")]
    ConnectionFailure {
        server: ServerEndpoint,
        message: String,
    },

    #[error("invalid domain name: {0}")]
    InvalidName(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("name server discovery failed: {0}")]
    Discovery(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl ResolveError {
    /// Timeouts and transient I/O failures are retried on the same server
    /// before moving on; everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolveError::Timeout { .. } | ResolveError::TransientIo { .. }
        )
    }

    /// Argument and programmer-state errors must propagate without any
    /// retry or server rotation.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            ResolveError::InvalidName(_) | ResolveError::Encode(_) | ResolveError::Options(_)
        )
    }
}

/// Resolver option validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("invalid resolver options: {field} must be strictly positive")]
    NotPositive { field: &'static str },

    #[error("invalid resolver options: {field} must not exceed {max:?}")]
    TooLarge { field: &'static str, max: Duration },
}
