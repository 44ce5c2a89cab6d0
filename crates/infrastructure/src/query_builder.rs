//! Builds outgoing requests from a question and the effective settings.

use ferrous_resolver_domain::{DnsRequest, EdnsRequest, QuerySettings, Question};
use rand::Rng;

/// Produces the pre-encoded request for a question.
pub struct QueryBuilder;

impl QueryBuilder {
    /// EDNS is attached iff the configured buffer exceeds 512 bytes or
    /// DNSSEC records were requested; the OPT record then advertises the
    /// clamped buffer size and mirrors the DO flag. The RD flag mirrors
    /// `recursion`.
    pub fn build(question: Question, settings: &QuerySettings) -> DnsRequest {
        let edns = settings.edns_enabled().then(|| EdnsRequest {
            udp_payload_size: settings.udp_payload_size(),
            dnssec_ok: settings.request_dnssec_records,
        });
        DnsRequest::new(fresh_xid(None), question, settings.recursion, edns)
    }
}

/// A new transaction id, uniformly drawn from the OS-seeded CSPRNG and
/// guaranteed to differ from `current` so consecutive sends never share an
/// id.
pub fn fresh_xid(current: Option<u16>) -> u16 {
    let mut rng = rand::thread_rng();
    loop {
        let id: u16 = rng.gen();
        if Some(id) != current {
            return id;
        }
    }
}
