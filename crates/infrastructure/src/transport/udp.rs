//! UDP transport (RFC 1035 §4.2.1). One request per datagram, one datagram
//! back; no framing. The receive buffer is sized to the EDNS payload the
//! request advertised, or the classic 512 bytes without EDNS. A response
//! with the TC bit set is the engine's cue to retry over TCP.

use super::{map_io_error, with_deadline};
use async_trait::async_trait;
use ferrous_resolver_application::ports::{DnsTransport, TransportProtocol, TransportReply};
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

pub struct UdpTransport;

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn exchange(
        &self,
        server: ServerEndpoint,
        payload: &[u8],
        timeout: Option<Duration>,
        max_response_size: usize,
    ) -> Result<TransportReply, ResolveError> {
        let addr = server.address();
        let bind_addr: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| ResolveError::ConnectionFailure {
                server,
                message: format!("failed to bind UDP socket: {}", e),
            })?;

        // Connecting filters datagrams from other sources at the kernel.
        socket
            .connect(addr)
            .await
            .map_err(|e| map_io_error(server, e))?;

        with_deadline(timeout, server, socket.send(payload))
            .await?
            .map_err(|e| map_io_error(server, e))?;

        debug!(server = %server, bytes = payload.len(), "UDP query sent");

        let mut buf = vec![0u8; max_response_size.max(512)];
        let received = with_deadline(timeout, server, socket.recv(&mut buf))
            .await?
            .map_err(|e| map_io_error(server, e))?;
        buf.truncate(received);

        debug!(server = %server, bytes = received, "UDP response received");

        Ok(TransportReply {
            bytes: buf,
            protocol: TransportProtocol::Udp,
        })
    }

    fn protocol(&self) -> TransportProtocol {
        TransportProtocol::Udp
    }
}
