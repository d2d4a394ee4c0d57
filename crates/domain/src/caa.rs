//! Certification Authority Authorization (RFC 8659).
//!
//! The protocol library has no constructor that accepts the textual form
//! used in routing rules, so CAA is registered as an extension type.

use crate::errors::DomainError;
use crate::record_value::{RecordConstructor, RecordValue};
use std::fmt;
use std::sync::Arc;

pub const CAA_TYPE_CODE: u16 = 257;
pub const CAA_TYPE_NAME: &str = "CAA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaaValue {
    pub flags: u8,
    pub tag: String,
    pub value: Vec<u8>,
}

impl CaaValue {
    pub fn new(flags: u8, tag: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<Self, DomainError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(DomainError::invalid_record(CAA_TYPE_NAME, "empty tag"));
        }
        if tag.len() > u8::MAX as usize {
            return Err(DomainError::invalid_record(
                CAA_TYPE_NAME,
                format!("tag is {} bytes, limit is 255", tag.len()),
            ));
        }
        if !tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_record(
                CAA_TYPE_NAME,
                format!("tag '{}' must be ASCII letters and digits", tag),
            ));
        }
        Ok(Self {
            flags,
            tag,
            value: value.into(),
        })
    }

    /// Parses `<flags> <tag> <value>`. Double quotes anywhere in the value
    /// are dropped, so `0 issue "letsencrypt.org"` yields `letsencrypt.org`.
    pub fn parse(data: &[u8]) -> Result<Self, DomainError> {
        let mut fields = data.splitn(3, |b| *b == b' ');
        let (Some(flags), Some(tag), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(DomainError::invalid_record(
                CAA_TYPE_NAME,
                "expected '<flags> <tag> <value>'",
            ));
        };

        let flags = std::str::from_utf8(flags)
            .ok()
            .and_then(|s| s.parse::<u8>().ok())
            .ok_or_else(|| {
                DomainError::invalid_record(
                    CAA_TYPE_NAME,
                    format!("flags '{}' is not an 8-bit integer", String::from_utf8_lossy(flags)),
                )
            })?;

        let tag = std::str::from_utf8(tag)
            .map_err(|_| DomainError::invalid_record(CAA_TYPE_NAME, "tag is not ASCII"))?;

        let value: Vec<u8> = value.iter().copied().filter(|b| *b != b'"').collect();

        Self::new(flags, tag, value)
    }

    pub fn is_critical(&self) -> bool {
        self.flags & 0x80 != 0
    }
}

impl RecordValue for CaaValue {
    fn type_code(&self) -> u16 {
        CAA_TYPE_CODE
    }

    fn to_wire(&self) -> Result<Vec<u8>, DomainError> {
        let len = 2 + self.tag.len() + self.value.len();
        if len > u16::MAX as usize {
            return Err(DomainError::RecordEncoding(format!(
                "CAA payload of {} bytes exceeds RDATA limit",
                len
            )));
        }
        let mut wire = Vec::with_capacity(len);
        wire.push(self.flags);
        wire.push(self.tag.len() as u8);
        wire.extend_from_slice(self.tag.as_bytes());
        wire.extend_from_slice(&self.value);
        Ok(wire)
    }
}

impl fmt::Display for CaaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\"",
            self.flags,
            self.tag,
            String::from_utf8_lossy(&self.value)
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CaaConstructor;

impl RecordConstructor for CaaConstructor {
    fn type_name(&self) -> &str {
        CAA_TYPE_NAME
    }

    fn type_code(&self) -> u16 {
        CAA_TYPE_CODE
    }

    fn construct(&self, data: &[u8]) -> Result<Arc<dyn RecordValue>, DomainError> {
        let value = CaaValue::parse(data)?;
        value.to_wire()?;
        Ok(Arc::new(value))
    }
}
