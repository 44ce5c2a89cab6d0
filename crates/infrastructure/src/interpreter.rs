//! Classifies parsed responses into the finite outcome set the engine
//! dispatches on. No control flow is carried by errors here; a response is
//! either usable, truncated, a DNS error, or unanswered.

use ferrous_resolver_domain::{DnsResponse, NameServer, QuerySettings, Question, RecordType};
use tracing::debug;

/// The tagged outcome of interpreting one response.
#[derive(Debug, Clone)]
pub enum ResponseOutcome {
    /// The response answers the question (or the unanswered heuristic is
    /// disabled) and carries no error.
    Answered(DnsResponse),
    /// TC bit set; the caller escalates to the TCP driver.
    Truncated,
    /// RCODE signals an error; the decision table decides what happens.
    DnsError(DnsResponse),
    /// No error, but the question was not answered.
    Unanswered(DnsResponse),
}

pub struct ResponseInterpreter;

impl ResponseInterpreter {
    /// Classifies `response` and applies its OPT side effect: a server that
    /// advertises an EDNS payload size gets that recorded on its roster
    /// entry for future buffer sizing.
    pub fn interpret(
        response: DnsResponse,
        question: &Question,
        settings: &QuerySettings,
        server: &NameServer,
    ) -> ResponseOutcome {
        if let Some(edns) = &response.edns {
            server.note_udp_payload(edns.udp_payload_size);
        }

        if response.truncated {
            debug!(server = %server, "response truncated");
            return ResponseOutcome::Truncated;
        }

        if response.rcode.is_error() {
            debug!(server = %server, rcode = %response.rcode, "server returned DNS error");
            return ResponseOutcome::DnsError(response);
        }

        if settings.continue_on_empty_response && !Self::question_answered(question, &response) {
            debug!(server = %server, "response does not answer the question");
            return ResponseOutcome::Unanswered(response);
        }

        ResponseOutcome::Answered(response)
    }

    /// The "answered" heuristic. ANY and AXFR questions accept anything;
    /// address questions are satisfied by a CNAME; NS questions by a
    /// delegation in the authority section; otherwise an answer of the
    /// queried type must be present.
    pub fn question_answered(question: &Question, response: &DnsResponse) -> bool {
        if response.answers.is_empty() {
            return false;
        }
        if question.record_type.is_any_or_axfr() {
            return true;
        }
        if question.record_type.is_address()
            && response
                .answers
                .iter()
                .any(|r| r.record_type == RecordType::CNAME)
        {
            return true;
        }
        if question.record_type == RecordType::NS && !response.authorities.is_empty() {
            return true;
        }
        response
            .answers
            .iter()
            .any(|r| r.record_type == question.record_type)
    }
}
