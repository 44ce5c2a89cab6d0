//! `MessageCodec` adapter over hickory-proto: RFC 1035 framing, name
//! compression and EDNS OPT handling all live behind this boundary.

use ferrous_resolver_application::ports::MessageCodec;
use ferrous_resolver_domain::{
    DnsRequest, DnsResponse, DomainName, EdnsInfo, Question, RecordClass, RecordData, RecordType,
    ResolveError, ResourceRecord, ResponseCode, ServerEndpoint,
};
use hickory_proto::error::ProtoError;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType as ProtoRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

pub struct HickoryCodec;

impl MessageCodec for HickoryCodec {
    fn encode(&self, request: &DnsRequest) -> Result<Vec<u8>, ResolveError> {
        let name = Name::from_str(&request.question.name.to_string()).map_err(|e| {
            ResolveError::InvalidName(format!("{}: {}", request.question.name, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(ProtoRecordType::from(request.question.record_type.to_u16()));
        query.set_query_class(to_proto_class(request.question.class));

        let mut message = Message::new();
        message.set_id(request.id);
        message.set_message_type(MessageType::Query);
        message.set_op_code(OpCode::Query);
        message.set_recursion_desired(request.recursion_desired);
        message.add_query(query);

        if let Some(edns) = &request.edns {
            let mut opt = Edns::new();
            opt.set_max_payload(edns.udp_payload_size);
            opt.set_version(0);
            opt.set_dnssec_ok(edns.dnssec_ok);
            message.set_edns(opt);
        }

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message
            .emit(&mut encoder)
            .map_err(|e| ResolveError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8], origin: ServerEndpoint) -> Result<DnsResponse, ResolveError> {
        let message = Message::from_vec(bytes).map_err(|e| ResolveError::Malformed {
            data_length: bytes.len(),
            overrun: is_overrun(&e),
        })?;

        let malformed = |_| ResolveError::Malformed {
            data_length: bytes.len(),
            overrun: false,
        };

        let mut questions = Vec::with_capacity(message.queries().len());
        for query in message.queries() {
            questions.push(Question::with_class(
                decode_name(query.name()).map_err(malformed)?,
                RecordType::from_u16(u16::from(query.query_type())),
                RecordClass::from_u16(u16::from(query.query_class())),
            ));
        }

        let edns = message.extensions().as_ref().map(|opt| EdnsInfo {
            udp_payload_size: opt.max_payload(),
            extended_rcode: opt.rcode_high(),
            version: opt.version(),
            dnssec_ok: opt.dnssec_ok(),
        });

        Ok(DnsResponse {
            id: message.id(),
            rcode: decode_rcode(&message),
            truncated: message.truncated(),
            authoritative: message.authoritative(),
            recursion_available: message.recursion_available(),
            questions,
            answers: decode_section(message.answers(), bytes.len())?,
            authorities: decode_section(message.name_servers(), bytes.len())?,
            additionals: decode_section(message.additionals(), bytes.len())?,
            edns,
            raw_len: bytes.len(),
            origin,
        })
    }
}

fn decode_section(
    records: &[Record],
    data_length: usize,
) -> Result<Vec<ResourceRecord>, ResolveError> {
    records
        .iter()
        .map(|record| decode_record(record, data_length))
        .collect()
}

fn decode_record(record: &Record, data_length: usize) -> Result<ResourceRecord, ResolveError> {
    let malformed = |_| ResolveError::Malformed {
        data_length,
        overrun: false,
    };
    let name = decode_name(record.name()).map_err(malformed)?;
    let record_type = RecordType::from_u16(u16::from(record.record_type()));
    let class = RecordClass::from_u16(u16::from(record.dns_class()));
    let data = match record.data() {
        Some(RData::A(a)) => RecordData::A(a.0),
        Some(RData::AAAA(aaaa)) => RecordData::AAAA(aaaa.0),
        Some(RData::CNAME(cname)) => RecordData::CNAME(decode_name(cname).map_err(malformed)?),
        Some(RData::NS(ns)) => RecordData::NS(decode_name(ns).map_err(malformed)?),
        Some(RData::PTR(ptr)) => RecordData::PTR(decode_name(ptr).map_err(malformed)?),
        Some(RData::MX(mx)) => RecordData::MX {
            preference: mx.preference(),
            exchange: decode_name(mx.exchange()).map_err(malformed)?,
        },
        Some(RData::TXT(txt)) => RecordData::TXT(
            txt.txt_data()
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect(),
        ),
        Some(RData::SOA(soa)) => RecordData::SOA {
            mname: decode_name(soa.mname()).map_err(malformed)?,
            rname: decode_name(soa.rname()).map_err(malformed)?,
            serial: soa.serial(),
            refresh: soa.refresh(),
            retry: soa.retry(),
            expire: soa.expire(),
            minimum: soa.minimum(),
        },
        Some(RData::SRV(srv)) => RecordData::SRV {
            priority: srv.priority(),
            weight: srv.weight(),
            port: srv.port(),
            target: decode_name(srv.target()).map_err(malformed)?,
        },
        Some(other) => RecordData::Other {
            code: record_type.to_u16(),
            data: other.to_bytes().unwrap_or_default(),
        },
        None => RecordData::Other {
            code: record_type.to_u16(),
            data: Vec::new(),
        },
    };

    Ok(ResourceRecord {
        name,
        record_type,
        class,
        ttl: record.ttl(),
        data,
    })
}

fn decode_name(name: &Name) -> Result<DomainName, ferrous_resolver_domain::NameError> {
    if name.is_root() {
        return Ok(DomainName::root());
    }
    DomainName::from_labels(name.iter())
}

fn decode_rcode(message: &Message) -> ResponseCode {
    use hickory_proto::op::ResponseCode as ProtoRcode;
    match message.response_code() {
        ProtoRcode::NoError => ResponseCode::NoError,
        ProtoRcode::FormErr => ResponseCode::FormErr,
        ProtoRcode::ServFail => ResponseCode::ServFail,
        ProtoRcode::NXDomain => ResponseCode::NxDomain,
        ProtoRcode::NotImp => ResponseCode::NotImp,
        ProtoRcode::Refused => ResponseCode::Refused,
        ProtoRcode::YXDomain => ResponseCode::YxDomain,
        ProtoRcode::YXRRSet => ResponseCode::YxRrSet,
        ProtoRcode::NXRRSet => ResponseCode::NxRrSet,
        ProtoRcode::NotAuth => ResponseCode::NotAuth,
        ProtoRcode::NotZone => ResponseCode::NotZone,
        ProtoRcode::BADVERS => ResponseCode::BadVers,
        other => ResponseCode::from_u16(u16::from(other)),
    }
}

fn to_proto_class(class: RecordClass) -> DNSClass {
    match class {
        RecordClass::IN => DNSClass::IN,
        RecordClass::CH => DNSClass::CH,
        RecordClass::HS => DNSClass::HS,
        RecordClass::NONE => DNSClass::NONE,
        RecordClass::ANY => DNSClass::ANY,
        // Unassigned classes cannot be expressed; queries use IN anyway.
        RecordClass::Unknown(_) => DNSClass::IN,
    }
}

/// Whether a decode failure looks like the parser running past the end of
/// the available data, which on UDP points at a datagram cut off in
/// transit rather than garbage.
fn is_overrun(error: &ProtoError) -> bool {
    let text = error.to_string().to_lowercase();
    text.contains("unexpected end")
        || text.contains("insufficient")
        || text.contains("not enough")
        || text.contains("buffer")
        || text.contains("overflow")
}
