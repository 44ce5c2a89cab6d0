//! Wire-level response builders for exercising the pipeline against the
//! real codec. Responses are built with id 0; the scripted transport
//! patches the id to echo the request, like a real server would.

use ferrous_resolver_domain::{
    NameServer, QuerySettings, Question, RecordType as DomainRecordType, ResolverOptions,
};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{rdata, Name, RData, Record, RecordType};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

pub fn question(name: &str) -> Question {
    Question::new(name.parse().unwrap(), DomainRecordType::A)
}

pub fn question_of(name: &str, record_type: DomainRecordType) -> Question {
    Question::new(name.parse().unwrap(), record_type)
}

pub fn settings_with(adjust: impl FnOnce(&mut ResolverOptions)) -> QuerySettings {
    let mut options = ResolverOptions::default();
    adjust(&mut options);
    options.effective(None)
}

/// `n` loopback servers on distinct ports, in deterministic order.
pub fn servers(n: usize) -> Vec<Arc<NameServer>> {
    (0..n)
        .map(|i| {
            Arc::new(NameServer::new(
                format!("127.0.0.1:{}", 5300 + i).parse().unwrap(),
            ))
        })
        .collect()
}

pub fn a_record(name: &str, ttl: u32, ip: Ipv4Addr) -> Record {
    Record::from_rdata(Name::from_str(name).unwrap(), ttl, RData::A(rdata::A(ip)))
}

pub fn cname_record(name: &str, ttl: u32, target: &str) -> Record {
    Record::from_rdata(
        Name::from_str(name).unwrap(),
        ttl,
        RData::CNAME(rdata::CNAME(Name::from_str(target).unwrap())),
    )
}

pub fn ns_record(name: &str, ttl: u32, target: &str) -> Record {
    Record::from_rdata(
        Name::from_str(name).unwrap(),
        ttl,
        RData::NS(rdata::NS(Name::from_str(target).unwrap())),
    )
}

/// A response message for `name`, with id 0 to be patched by the mock.
pub fn response(
    name: &str,
    rcode: ResponseCode,
    truncated: bool,
    answers: Vec<Record>,
) -> Vec<u8> {
    response_message(name, RecordType::A, rcode, truncated, answers, Vec::new())
}

pub fn response_message(
    name: &str,
    query_type: RecordType,
    rcode: ResponseCode,
    truncated: bool,
    answers: Vec<Record>,
    authorities: Vec<Record>,
) -> Vec<u8> {
    let mut message = Message::new();
    message.set_id(0);
    message.set_message_type(MessageType::Response);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.set_recursion_available(true);
    message.set_response_code(rcode);
    message.set_truncated(truncated);

    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(query_type);
    message.add_query(query);

    for record in answers {
        message.add_answer(record);
    }
    for record in authorities {
        message.add_name_server(record);
    }
    message.to_vec().unwrap()
}

pub fn a_response(name: &str, ttl: u32, ip: Ipv4Addr) -> Vec<u8> {
    response(
        name,
        ResponseCode::NoError,
        false,
        vec![a_record(name, ttl, ip)],
    )
}

pub fn empty_response(name: &str) -> Vec<u8> {
    response(name, ResponseCode::NoError, false, Vec::new())
}

pub fn truncated_response(name: &str) -> Vec<u8> {
    response(name, ResponseCode::NoError, true, Vec::new())
}

pub fn rcode_response(name: &str, rcode: ResponseCode) -> Vec<u8> {
    response(name, rcode, false, Vec::new())
}

pub const EXAMPLE_IP: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
