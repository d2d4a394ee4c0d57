use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid routing rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("Invalid {record_type} record data: {reason}")]
    InvalidRecordData { record_type: String, reason: String },

    #[error("Record type already registered: {0}")]
    DuplicateRecordType(String),

    #[error("Failed to encode record: {0}")]
    RecordEncoding(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Script failed: {0}")]
    ScriptFailed(String),

    #[error("Invalid DNS message: {0}")]
    InvalidDnsMessage(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport error with {server}: {reason}")]
    TransportError { server: String, reason: String },

    #[error("No upstream servers configured")]
    NoUpstreamServers,

    #[error("Failed to load routes from {source_name}: {reason}")]
    RouteSourceError { source_name: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn invalid_rule(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid_record(record_type: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecordData {
            record_type: record_type.to_string(),
            reason: reason.into(),
        }
    }
}
