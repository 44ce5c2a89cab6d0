use ferrous_resolver_domain::{DnsRequest, DnsResponse, ResolveError, ServerEndpoint};

/// Encodes requests to and decodes responses from DNS wire format.
///
/// Decoding failures map to [`ResolveError::Malformed`] carrying the message
/// size and whether the decoder overran the available data; the engine uses
/// both to recognize truncated-in-transit UDP datagrams.
pub trait MessageCodec: Send + Sync {
    fn encode(&self, request: &DnsRequest) -> Result<Vec<u8>, ResolveError>;

    fn decode(&self, bytes: &[u8], origin: ServerEndpoint) -> Result<DnsResponse, ResolveError>;
}
