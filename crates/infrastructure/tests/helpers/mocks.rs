//! Scripted port implementations: a transport that replays canned replies
//! and records every send, and discovery doubles for roster tests.

use async_trait::async_trait;
use ferrous_resolver_application::ports::{
    DnsTransport, ServerDiscovery, TransportProtocol, TransportReply,
};
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One canned transport reply, consumed in order. When the script runs dry
/// every further exchange times out.
pub enum Reply {
    /// Response bytes; the first two bytes are patched to echo the request
    /// id, as a well-behaved server would.
    Answer(Vec<u8>),
    /// Like `Answer`, but after a delay. For racing concurrent callers.
    AnswerAfter(Vec<u8>, Duration),
    /// Response bytes with the id deliberately flipped to NOT match.
    AnswerWrongId(Vec<u8>),
    /// A per-invocation deadline expiry.
    Timeout,
    /// Any other failure.
    Fail(ResolveError),
}

pub struct SentQuery {
    pub server: ServerEndpoint,
    pub xid: u16,
    pub bytes: Vec<u8>,
}

pub struct ScriptedTransport {
    protocol: TransportProtocol,
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<SentQuery>>,
}

impl ScriptedTransport {
    pub fn udp(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            protocol: TransportProtocol::Udp,
            replies: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn tcp(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            protocol: TransportProtocol::Tcp,
            replies: Mutex::new(replies.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_xids(&self) -> Vec<u16> {
        self.sent.lock().unwrap().iter().map(|s| s.xid).collect()
    }

    pub fn sent_servers(&self) -> Vec<ServerEndpoint> {
        self.sent.lock().unwrap().iter().map(|s| s.server).collect()
    }
}

#[async_trait]
impl DnsTransport for ScriptedTransport {
    async fn exchange(
        &self,
        server: ServerEndpoint,
        payload: &[u8],
        _timeout: Option<Duration>,
        _max_response_size: usize,
    ) -> Result<TransportReply, ResolveError> {
        let xid = u16::from_be_bytes([payload[0], payload[1]]);
        self.sent.lock().unwrap().push(SentQuery {
            server,
            xid,
            bytes: payload.to_vec(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Timeout);

        let patched = |mut bytes: Vec<u8>, id: u16| {
            if bytes.len() >= 2 {
                bytes[0..2].copy_from_slice(&id.to_be_bytes());
            }
            bytes
        };

        match reply {
            Reply::Answer(bytes) => Ok(TransportReply {
                bytes: patched(bytes, xid),
                protocol: self.protocol,
            }),
            Reply::AnswerAfter(bytes, delay) => {
                tokio::time::sleep(delay).await;
                Ok(TransportReply {
                    bytes: patched(bytes, xid),
                    protocol: self.protocol,
                })
            }
            Reply::AnswerWrongId(bytes) => Ok(TransportReply {
                bytes: patched(bytes, xid ^ 0x5555),
                protocol: self.protocol,
            }),
            Reply::Timeout => Err(ResolveError::Timeout { server }),
            Reply::Fail(error) => Err(error),
        }
    }

    fn protocol(&self) -> TransportProtocol {
        self.protocol
    }
}

/// Discovery double that counts invocations and replays result sets.
pub struct ScriptedDiscovery {
    results: Mutex<VecDeque<Result<Vec<ServerEndpoint>, ResolveError>>>,
    calls: AtomicUsize,
}

impl ScriptedDiscovery {
    pub fn returning(servers: Vec<ServerEndpoint>) -> Arc<Self> {
        Self::with_results([Ok(servers)])
    }

    pub fn failing() -> Arc<Self> {
        Self::with_results([Err(ResolveError::Discovery("interface walk failed".into()))])
    }

    pub fn with_results(
        results: impl IntoIterator<Item = Result<Vec<ServerEndpoint>, ResolveError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerDiscovery for ScriptedDiscovery {
    async fn discover(&self) -> Result<Vec<ServerEndpoint>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
