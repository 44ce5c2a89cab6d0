//! TCP transport: a 2-byte network-order length prefix followed by the
//! message bytes, same framing both ways.

use super::{map_io_error, with_deadline, MAX_TCP_MESSAGE_SIZE};
use async_trait::async_trait;
use ferrous_resolver_application::ports::{DnsTransport, TransportProtocol, TransportReply};
use ferrous_resolver_domain::{ResolveError, ServerEndpoint};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub struct TcpTransport;

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn exchange(
        &self,
        server: ServerEndpoint,
        payload: &[u8],
        timeout: Option<Duration>,
        _max_response_size: usize,
    ) -> Result<TransportReply, ResolveError> {
        if payload.len() > MAX_TCP_MESSAGE_SIZE {
            return Err(ResolveError::Encode(format!(
                "message of {} bytes exceeds the stream framing limit",
                payload.len()
            )));
        }

        let mut stream = with_deadline(timeout, server, TcpStream::connect(server.address()))
            .await?
            .map_err(|e| map_io_error(server, e))?;

        with_deadline(timeout, server, send_framed(&mut stream, payload))
            .await?
            .map_err(|e| map_io_error(server, e))?;

        debug!(server = %server, bytes = payload.len(), "TCP query sent");

        let bytes = with_deadline(timeout, server, read_framed(&mut stream))
            .await?
            .map_err(|e| map_io_error(server, e))?;

        debug!(server = %server, bytes = bytes.len(), "TCP response received");

        Ok(TransportReply {
            bytes,
            protocol: TransportProtocol::Tcp,
        })
    }

    fn protocol(&self) -> TransportProtocol {
        TransportProtocol::Tcp
    }
}

async fn send_framed<S>(stream: &mut S, payload: &[u8]) -> std::io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = (payload.len() as u16).to_be_bytes();
    stream.write_all(&length).await?;
    stream.write_all(payload).await?;
    stream.flush().await
}

async fn read_framed<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut length = [0u8; 2];
    stream.read_exact(&mut length).await?;
    let length = u16::from_be_bytes(length) as usize;
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}
