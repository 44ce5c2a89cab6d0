use crate::question::Question;
use crate::record::ResourceRecord;
use crate::response_code::ResponseCode;
use crate::server::ServerEndpoint;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// EDNS data extracted from a response's OPT pseudo-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdnsInfo {
    /// The UDP payload size the server advertises it can accept.
    pub udp_payload_size: u16,
    /// High byte of the 12-bit extended RCODE.
    pub extended_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
}

/// A parsed response message plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResponse {
    pub id: u16,
    pub rcode: ResponseCode,
    pub truncated: bool,
    pub authoritative: bool,
    pub recursion_available: bool,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
    pub edns: Option<EdnsInfo>,
    /// Size of the wire message this was decoded from.
    pub raw_len: usize,
    /// The server that produced the response.
    pub origin: ServerEndpoint,
}

impl DnsResponse {
    pub fn is_error(&self) -> bool {
        self.rcode.is_error()
    }

    /// All records across the answer, authority and additional sections.
    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
    }

    /// The smallest TTL over every record in the message, or `None` when
    /// there are no records. This is what bounds cacheability.
    pub fn min_ttl(&self) -> Option<u32> {
        self.records().map(|r| r.ttl).min()
    }

    /// Addresses from A and AAAA answer records.
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.answers.iter().filter_map(|r| r.as_ip()).collect()
    }
}
