//! Record constructors for types the protocol library encodes natively.
//!
//! Each constructor parses the rendered response text into a hickory
//! `RData` and encodes it once, so a value that cannot be put on the wire
//! is rejected at construction time.

use dnsroute_domain::{DomainError, RecordConstructor, RecordValue};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, PTR, SOA, SRV, TXT};
use hickory_proto::rr::{Name, RData};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder, NameEncoding};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

/// Longest character-string a TXT record can carry in one segment.
const TXT_SEGMENT_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    A,
    Aaaa,
    Cname,
    Ns,
    Ptr,
    Mx,
    Txt,
    Srv,
    Soa,
}

#[derive(Debug, Clone, Copy)]
pub struct StandardConstructor {
    name: &'static str,
    code: u16,
    kind: NativeKind,
}

impl StandardConstructor {
    pub const fn new(name: &'static str, code: u16, kind: NativeKind) -> Self {
        Self { name, code, kind }
    }

    fn parse_rdata(&self, text: &str) -> Result<RData, DomainError> {
        let rdata = match self.kind {
            NativeKind::A => RData::A(A(parse_addr::<Ipv4Addr>(self.name, text)?)),
            NativeKind::Aaaa => RData::AAAA(AAAA(parse_addr::<Ipv6Addr>(self.name, text)?)),
            NativeKind::Cname => RData::CNAME(CNAME(parse_name(self.name, text)?)),
            NativeKind::Ns => RData::NS(NS(parse_name(self.name, text)?)),
            NativeKind::Ptr => RData::PTR(PTR(parse_name(self.name, text)?)),
            NativeKind::Mx => {
                let [preference, exchange] = fields::<2>(self.name, text)?;
                RData::MX(MX::new(
                    parse_number(self.name, "preference", preference)?,
                    parse_name(self.name, exchange)?,
                ))
            }
            NativeKind::Txt => RData::TXT(TXT::new(split_txt(text))),
            NativeKind::Srv => {
                let [priority, weight, port, target] = fields::<4>(self.name, text)?;
                RData::SRV(SRV::new(
                    parse_number(self.name, "priority", priority)?,
                    parse_number(self.name, "weight", weight)?,
                    parse_number(self.name, "port", port)?,
                    parse_name(self.name, target)?,
                ))
            }
            NativeKind::Soa => {
                let [mname, rname, serial, refresh, retry, expire, minimum] =
                    fields::<7>(self.name, text)?;
                RData::SOA(SOA::new(
                    parse_name(self.name, mname)?,
                    parse_name(self.name, rname)?,
                    parse_number(self.name, "serial", serial)?,
                    parse_number(self.name, "refresh", refresh)?,
                    parse_number(self.name, "retry", retry)?,
                    parse_number(self.name, "expire", expire)?,
                    parse_number(self.name, "minimum", minimum)?,
                ))
            }
        };
        Ok(rdata)
    }
}

impl RecordConstructor for StandardConstructor {
    fn type_name(&self) -> &str {
        self.name
    }

    fn type_code(&self) -> u16 {
        self.code
    }

    fn construct(&self, data: &[u8]) -> Result<Arc<dyn RecordValue>, DomainError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| DomainError::invalid_record(self.name, "response is not UTF-8"))?;
        let rdata = self.parse_rdata(text.trim())?;
        let wire = encode_rdata(&rdata)?;
        Ok(Arc::new(StandardValue {
            code: self.code,
            rdata,
            wire,
        }))
    }
}

/// A natively supported record together with its encoded RDATA.
#[derive(Debug, Clone)]
pub struct StandardValue {
    code: u16,
    rdata: RData,
    wire: Vec<u8>,
}

impl RecordValue for StandardValue {
    fn type_code(&self) -> u16 {
        self.code
    }

    fn to_wire(&self) -> Result<Vec<u8>, DomainError> {
        Ok(self.wire.clone())
    }
}

impl fmt::Display for StandardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rdata)
    }
}

/// Names inside RDATA are written uncompressed: the bytes are later placed
/// into a message at an offset this encoder cannot know.
fn encode_rdata(rdata: &RData) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(64);
    let mut encoder = BinEncoder::new(&mut buf);
    // Canonical mode only turns off compression; labels keep their case.
    encoder.set_name_encoding(NameEncoding::Uncompressed);
    rdata
        .emit(&mut encoder)
        .map_err(|e| DomainError::RecordEncoding(e.to_string()))?;
    Ok(buf)
}

fn parse_addr<T: FromStr>(record_type: &str, text: &str) -> Result<T, DomainError> {
    text.parse()
        .map_err(|_| DomainError::invalid_record(record_type, format!("'{}' is not an address", text)))
}

fn parse_name(record_type: &str, text: &str) -> Result<Name, DomainError> {
    let mut name = Name::from_str(text).map_err(|e| {
        DomainError::invalid_record(record_type, format!("'{}' is not a domain name: {}", text, e))
    })?;
    name.set_fqdn(true);
    Ok(name)
}

fn parse_number<T: FromStr>(record_type: &str, field: &str, text: &str) -> Result<T, DomainError> {
    text.parse().map_err(|_| {
        DomainError::invalid_record(record_type, format!("{} '{}' is not a valid number", field, text))
    })
}

fn fields<'a, const N: usize>(record_type: &str, text: &'a str) -> Result<[&'a str; N], DomainError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    parts.try_into().map_err(|parts: Vec<&str>| {
        DomainError::invalid_record(
            record_type,
            format!("expected {} fields, found {}", N, parts.len()),
        )
    })
}

fn split_txt(text: &str) -> Vec<String> {
    if text.len() <= TXT_SEGMENT_LEN {
        return vec![text.to_string()];
    }

    let mut segments = Vec::new();
    let mut current = String::with_capacity(TXT_SEGMENT_LEN);
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > TXT_SEGMENT_LEN {
            segments.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
