mod audit;
mod message_codec;
mod server_discovery;
mod transport;

pub use audit::{AuditEvent, AuditSink};
pub use message_codec::MessageCodec;
pub use server_discovery::ServerDiscovery;
pub use transport::{DnsTransport, TransportProtocol, TransportReply};
