//! Record payloads and the constructors that build them from rendered
//! response text.

use crate::errors::DomainError;
use std::fmt;
use std::sync::Arc;

/// A record payload that knows how to encode itself into RDATA bytes.
pub trait RecordValue: fmt::Debug + fmt::Display + Send + Sync {
    fn type_code(&self) -> u16;

    /// RDATA bytes for this record, without the RDLENGTH prefix.
    fn to_wire(&self) -> Result<Vec<u8>, DomainError>;
}

/// Builds a [`RecordValue`] of one specific type from its textual form.
pub trait RecordConstructor: Send + Sync {
    fn type_name(&self) -> &str;

    fn type_code(&self) -> u16;

    fn construct(&self, data: &[u8]) -> Result<Arc<dyn RecordValue>, DomainError>;
}

/// Payload of a type with no dedicated constructor. The rendered bytes are
/// used verbatim as RDATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueValue {
    type_code: u16,
    data: Vec<u8>,
}

impl OpaqueValue {
    pub fn new(type_code: u16, data: Vec<u8>) -> Self {
        Self { type_code, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl RecordValue for OpaqueValue {
    fn type_code(&self) -> u16 {
        self.type_code
    }

    fn to_wire(&self) -> Result<Vec<u8>, DomainError> {
        if self.data.len() > u16::MAX as usize {
            return Err(DomainError::RecordEncoding(format!(
                "opaque payload of {} bytes exceeds RDATA limit",
                self.data.len()
            )));
        }
        Ok(self.data.clone())
    }
}

impl fmt::Display for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // RFC 3597 generic notation
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            f.write_str(" ")?;
            for byte in &self.data {
                write!(f, "{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OpaqueConstructor {
    type_name: String,
    type_code: u16,
}

impl OpaqueConstructor {
    pub fn new(type_name: impl Into<String>, type_code: u16) -> Self {
        Self {
            type_name: type_name.into(),
            type_code,
        }
    }
}

impl RecordConstructor for OpaqueConstructor {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn type_code(&self) -> u16 {
        self.type_code
    }

    fn construct(&self, data: &[u8]) -> Result<Arc<dyn RecordValue>, DomainError> {
        let value = OpaqueValue::new(self.type_code, data.to_vec());
        value.to_wire()?;
        Ok(Arc::new(value))
    }
}
