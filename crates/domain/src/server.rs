use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// A name server address. Conversions are explicit; validity is a method
/// rather than a parse-time failure so rosters can filter rather than abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerEndpoint(SocketAddr);

impl ServerEndpoint {
    pub const DNS_PORT: u16 = 53;

    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    pub fn from_ip(ip: IpAddr) -> Self {
        Self(SocketAddr::new(ip, Self::DNS_PORT))
    }

    pub fn address(&self) -> SocketAddr {
        self.0
    }

    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }

    /// A server is dispatchable iff its address is a real destination:
    /// not the any-address and not port zero.
    pub fn is_valid(&self) -> bool {
        !self.0.ip().is_unspecified() && self.0.port() != 0
    }
}

impl From<SocketAddr> for ServerEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr)
    }
}

impl From<IpAddr> for ServerEndpoint {
    fn from(ip: IpAddr) -> Self {
        Self::from_ip(ip)
    }
}

impl FromStr for ServerEndpoint {
    type Err = String;

    /// Accepts `ip:port`, `[v6]:port`, or a bare IP (port defaults to 53).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::new(addr));
        }
        s.parse::<IpAddr>()
            .map(Self::from_ip)
            .map_err(|e| format!("invalid name server endpoint '{}': {}", s, e))
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A roster entry: the endpoint plus what the server last advertised about
/// itself. The EDNS payload size is updated from response OPT records and
/// read when sizing UDP receive buffers.
#[derive(Debug)]
pub struct NameServer {
    endpoint: ServerEndpoint,
    advertised_udp_payload: AtomicU32,
}

impl NameServer {
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            advertised_udp_payload: AtomicU32::new(0),
        }
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint
    }

    /// The EDNS UDP payload size this server advertised, if any response
    /// carried an OPT record yet.
    pub fn advertised_udp_payload(&self) -> Option<u16> {
        match self.advertised_udp_payload.load(Ordering::Relaxed) {
            0 => None,
            size => Some(size as u16),
        }
    }

    pub fn note_udp_payload(&self, size: u16) {
        self.advertised_udp_payload
            .store(u32::from(size), Ordering::Relaxed);
    }
}

impl From<ServerEndpoint> for NameServer {
    fn from(endpoint: ServerEndpoint) -> Self {
        Self::new(endpoint)
    }
}

impl PartialEq for NameServer {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
    }
}

impl Eq for NameServer {}

impl fmt::Display for NameServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint)
    }
}
