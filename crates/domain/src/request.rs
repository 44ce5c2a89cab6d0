use crate::question::Question;
use serde::{Deserialize, Serialize};

/// EDNS parameters attached to an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdnsRequest {
    pub udp_payload_size: u16,
    pub dnssec_ok: bool,
}

/// An outgoing query message in its pre-encoded form.
///
/// The transaction id is the only field that changes across retransmissions
/// of the same logical query; everything else is fixed when the request is
/// built so later option mutation cannot alter in-flight behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRequest {
    pub id: u16,
    pub recursion_desired: bool,
    pub question: Question,
    pub edns: Option<EdnsRequest>,
}

impl DnsRequest {
    pub fn new(
        id: u16,
        question: Question,
        recursion_desired: bool,
        edns: Option<EdnsRequest>,
    ) -> Self {
        Self {
            id,
            recursion_desired,
            question,
            edns,
        }
    }

    /// The response buffer this request invites: the advertised EDNS payload
    /// size, or the classic 512-byte limit without EDNS.
    pub fn max_udp_payload(&self) -> u16 {
        self.edns.map(|e| e.udp_payload_size).unwrap_or(512)
    }
}
