//! DNS wire format for the route server.
//!
//! Incoming queries are scanned straight from the packet buffer: header,
//! the single question and the client's EDNS payload size. Responses are
//! assembled as hickory `Message`s and serialized through `BinEncoder`.

use dnsroute_domain::{AnswerRecord, DomainError, RouteQuery};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::NULL;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
use std::str::FromStr;

pub const HEADER_LEN: usize = 12;

/// Largest UDP response a client without EDNS(0) accepts (RFC 1035 §4.2.1).
pub const MAX_UDP_PAYLOAD: usize = 512;

/// Largest message the two-byte TCP length prefix can frame.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// Payload size advertised in our own OPT record.
const EDNS_PAYLOAD: u16 = 4096;

const MAX_NAME_LEN: usize = 253;
const TYPE_OPT: u16 = 41;

const FLAG_QR: u16 = 0x8000;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;
const OPCODE_MASK: u16 = 0x7800;

/// Fixed part of a DNS header, read before anything else is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
}

impl Header {
    /// `None` when the buffer cannot even hold a header.
    pub fn peek(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            flags: u16::from_be_bytes([buf[2], buf[3]]),
        })
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> 11) as u8
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }
}

/// The single question of an incoming query.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub header: Header,
    /// Query name without the trailing dot, case preserved.
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
    /// The question as decoded by hickory, echoed in every response.
    pub question: Query,
    /// UDP payload size from the client's OPT record, when present.
    pub edns_payload: Option<u16>,
}

impl ParsedQuery {
    pub fn route_query(&self) -> RouteQuery {
        RouteQuery::new(self.name.as_str(), self.qclass, self.qtype)
    }

    /// Largest UDP response this client accepts.
    pub fn max_udp_size(&self) -> usize {
        self.edns_payload
            .map(|size| (size as usize).max(MAX_UDP_PAYLOAD))
            .unwrap_or(MAX_UDP_PAYLOAD)
    }
}

/// A response message together with its serialized form.
#[derive(Debug)]
pub struct Reply {
    pub message: Message,
    pub wire: Vec<u8>,
}

impl Reply {
    pub fn encode(message: Message) -> Result<Self, DomainError> {
        let wire = encode(&message)?;
        Ok(Self { message, wire })
    }
}

pub fn parse_query(buf: &[u8]) -> Result<ParsedQuery, DomainError> {
    let header = Header::peek(buf).ok_or_else(|| malformed("message shorter than header"))?;
    if header.is_response() {
        return Err(malformed("message is a response"));
    }

    let qdcount = read_u16(buf, 4)?;
    if qdcount != 1 {
        return Err(malformed(format!("expected one question, found {}", qdcount)));
    }
    let ancount = read_u16(buf, 6)?;
    let nscount = read_u16(buf, 8)?;
    let arcount = read_u16(buf, 10)?;

    let (name, mut pos) = read_question_name(buf, HEADER_LEN)?;
    let qtype = read_u16(buf, pos)?;
    let qclass = read_u16(buf, pos + 2)?;
    pos += 4;

    let question = Query::from_bytes(&buf[HEADER_LEN..pos])
        .map_err(|e| malformed(format!("undecodable question: {}", e)))?;

    for _ in 0..(ancount as usize + nscount as usize) {
        pos = skip_record(buf, pos)?;
    }

    let mut edns_payload = None;
    for _ in 0..arcount {
        pos = skip_name(buf, pos)?;
        let rr_type = read_u16(buf, pos)?;
        if rr_type == TYPE_OPT {
            edns_payload = Some(read_u16(buf, pos + 2)?);
        }
        let rdlen = read_u16(buf, pos + 8)? as usize;
        pos += 10 + rdlen;
        if pos > buf.len() {
            return Err(malformed("additional record overruns message"));
        }
    }

    Ok(ParsedQuery {
        header,
        name,
        qtype,
        qclass,
        question,
        edns_payload,
    })
}

/// Authoritative NOERROR response carrying `answers`. Record data goes on
/// the wire exactly as the record value encoded it.
pub fn answer_message(query: &ParsedQuery, answers: &[AnswerRecord]) -> Result<Message, DomainError> {
    let mut message = response_to(query.header, ResponseCode::NoError);
    message.set_authoritative(true);
    message.add_query(query.question.clone());
    for answer in answers {
        message.add_answer(answer_record(query, answer)?);
    }
    echo_edns(&mut message, query);
    Ok(message)
}

/// Answerless response with `rcode`. The question is echoed when the query
/// could be parsed.
pub fn error_message(header: Header, query: Option<&ParsedQuery>, rcode: ResponseCode) -> Message {
    let mut message = response_to(header, rcode);
    if let Some(query) = query {
        message.add_query(query.question.clone());
        echo_edns(&mut message, query);
    }
    message
}

/// Serializes `message`, rejecting anything a TCP length prefix cannot frame.
pub fn encode(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(MAX_UDP_PAYLOAD);
    let mut encoder = BinEncoder::new(&mut buf);

    message
        .emit(&mut encoder)
        .map_err(|e| DomainError::RecordEncoding(format!("failed to serialize DNS message: {}", e)))?;

    if buf.len() > MAX_MESSAGE_LEN {
        return Err(DomainError::RecordEncoding(format!(
            "message of {} bytes exceeds {} bytes",
            buf.len(),
            MAX_MESSAGE_LEN
        )));
    }
    Ok(buf)
}

/// Query message for a question that arrived already decoded.
pub fn encode_query(id: u16, recursion_desired: bool, question: Query) -> Result<Vec<u8>, DomainError> {
    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(recursion_desired);
    message.add_query(question);
    encode(&message)
}

/// Fits a reply into the client's UDP limit: an oversized one is replaced
/// by a header-plus-question response with TC set so the client retries
/// over TCP.
pub fn fit_udp(query: &ParsedQuery, reply: Reply) -> Result<Vec<u8>, DomainError> {
    if reply.wire.len() <= query.max_udp_size() {
        return Ok(reply.wire);
    }

    let mut truncated = response_to(query.header, reply.message.response_code());
    truncated.set_authoritative(reply.message.authoritative());
    truncated.set_truncated(true);
    truncated.add_query(query.question.clone());
    encode(&truncated)
}

/// Overwrites the message ID in place.
pub fn set_id(message: &mut [u8], id: u16) {
    if message.len() >= 2 {
        message[..2].copy_from_slice(&id.to_be_bytes());
    }
}

pub fn message_id(message: &[u8]) -> Option<u16> {
    Header::peek(message).map(|h| h.id)
}

fn response_to(header: Header, rcode: ResponseCode) -> Message {
    let mut message = Message::new(header.id, MessageType::Response, op_code(header.opcode()));
    message.set_recursion_desired(header.recursion_desired());
    message.set_recursion_available(true);
    message.set_response_code(rcode);
    message
}

fn answer_record(query: &ParsedQuery, answer: &AnswerRecord) -> Result<Record, DomainError> {
    let owner = if *answer.name == *query.name {
        query.question.name().clone()
    } else {
        fqdn(&answer.name)?
    };

    let data = answer.value.to_wire()?;
    let rdata = RData::Unknown {
        code: RecordType::from(answer.record_type),
        rdata: if data.is_empty() { NULL::new() } else { NULL::with(data) },
    };

    let mut record = Record::from_rdata(owner, answer.ttl, rdata);
    record.set_dns_class(dns_class(answer.class)?);
    Ok(record)
}

fn echo_edns(message: &mut Message, query: &ParsedQuery) {
    if query.edns_payload.is_some() {
        let mut edns = Edns::new();
        edns.set_max_payload(EDNS_PAYLOAD);
        message.set_edns(edns);
    }
}

/// Unassigned opcodes are answered as QUERY.
fn op_code(code: u8) -> OpCode {
    match code {
        2 => OpCode::Status,
        4 => OpCode::Notify,
        5 => OpCode::Update,
        _ => OpCode::Query,
    }
}

fn dns_class(code: u16) -> Result<DNSClass, DomainError> {
    match code {
        1 => Ok(DNSClass::IN),
        3 => Ok(DNSClass::CH),
        4 => Ok(DNSClass::HS),
        254 => Ok(DNSClass::NONE),
        255 => Ok(DNSClass::ANY),
        other => Err(DomainError::RecordEncoding(format!("unsupported record class {}", other))),
    }
}

fn fqdn(name: &str) -> Result<Name, DomainError> {
    let mut name = Name::from_str(name)
        .map_err(|e| DomainError::RecordEncoding(format!("invalid owner name '{}': {}", name, e)))?;
    name.set_fqdn(true);
    Ok(name)
}

/// Question names are never compressed; a pointer here is a format error.
fn read_question_name(buf: &[u8], mut pos: usize) -> Result<(String, usize), DomainError> {
    let mut name = String::new();

    loop {
        let len = *buf.get(pos).ok_or_else(|| malformed("question name overruns message"))? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        if len & 0xC0 != 0 {
            return Err(malformed("compressed or extended label in question"));
        }
        let label = buf
            .get(pos..pos + len)
            .ok_or_else(|| malformed("label overruns message"))?;
        let label = std::str::from_utf8(label).map_err(|_| malformed("label is not UTF-8"))?;

        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(label);
        if name.len() > MAX_NAME_LEN {
            return Err(malformed("query name too long"));
        }
        pos += len;
    }

    Ok((name, pos))
}

fn skip_name(buf: &[u8], mut pos: usize) -> Result<usize, DomainError> {
    loop {
        let len = *buf.get(pos).ok_or_else(|| malformed("name overruns message"))? as usize;
        match len {
            0 => return Ok(pos + 1),
            l if l & 0xC0 == 0xC0 => return Ok(pos + 2),
            l if l & 0xC0 != 0 => return Err(malformed("unsupported label type")),
            l => pos += 1 + l,
        }
    }
}

fn skip_record(buf: &[u8], pos: usize) -> Result<usize, DomainError> {
    let pos = skip_name(buf, pos)?;
    let rdlen = read_u16(buf, pos + 8)? as usize;
    let end = pos + 10 + rdlen;
    if end > buf.len() {
        return Err(malformed("record overruns message"));
    }
    Ok(end)
}

fn read_u16(buf: &[u8], pos: usize) -> Result<u16, DomainError> {
    buf.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| malformed("message truncated"))
}

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::InvalidDnsMessage(reason.into())
}
