//! Record type registry: canonical names, numeric codes and constructors.
//!
//! Built once at startup and shared read-only. Standard types come from the
//! protocol library; CAA is registered on top as an extension.

use super::standard_records::{NativeKind, StandardConstructor};
use dnsroute_domain::{CaaConstructor, DomainError, OpaqueConstructor, RecordConstructor, RuleType};
use std::collections::HashMap;
use std::sync::Arc;

/// Name reported for numeric codes the registry does not know.
pub const UNKNOWN_TYPE_NAME: &str = "UnknownType";

/// Well-known types. `None` means the name is known but responses are
/// passed through as opaque RDATA.
const STANDARD_TYPES: &[(&str, u16, Option<NativeKind>)] = &[
    ("A", 1, Some(NativeKind::A)),
    ("NS", 2, Some(NativeKind::Ns)),
    ("CNAME", 5, Some(NativeKind::Cname)),
    ("SOA", 6, Some(NativeKind::Soa)),
    ("NULL", 10, None),
    ("WKS", 11, None),
    ("PTR", 12, Some(NativeKind::Ptr)),
    ("HINFO", 13, None),
    ("MX", 15, Some(NativeKind::Mx)),
    ("TXT", 16, Some(NativeKind::Txt)),
    ("RP", 17, None),
    ("AFSDB", 18, None),
    ("AAAA", 28, Some(NativeKind::Aaaa)),
    ("SRV", 33, Some(NativeKind::Srv)),
    ("NAPTR", 35, None),
    ("DNAME", 39, None),
    ("OPT", 41, None),
    ("DS", 43, None),
    ("SSHFP", 44, None),
    ("RRSIG", 46, None),
    ("NSEC", 47, None),
    ("DNSKEY", 48, None),
    ("NSEC3", 50, None),
    ("NSEC3PARAM", 51, None),
    ("TLSA", 52, None),
    ("CDS", 59, None),
    ("CDNSKEY", 60, None),
    ("OPENPGPKEY", 61, None),
    ("SVCB", 64, None),
    ("HTTPS", 65, None),
    ("SPF", 99, None),
    ("TKEY", 249, None),
    ("TSIG", 250, None),
    ("IXFR", 251, None),
    ("AXFR", 252, None),
    ("ANY", 255, None),
];

/// A declared rule type resolved against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType<'a> {
    pub code: u16,
    pub name: &'a str,
}

pub struct RecordTypeRegistry {
    constructors: HashMap<String, Arc<dyn RecordConstructor>>,
    names: HashMap<u16, String>,
}

impl RecordTypeRegistry {
    pub fn builder() -> RecordTypeRegistryBuilder {
        RecordTypeRegistryBuilder::new()
    }

    /// Standard types plus the CAA extension.
    pub fn standard() -> Self {
        let mut builder = RecordTypeRegistryBuilder::new().with_standard_types();
        builder.insert(Arc::new(CaaConstructor));
        builder.build()
    }

    pub fn code_for(&self, name: &str) -> Option<u16> {
        self.constructors.get(name).map(|ctor| ctor.type_code())
    }

    pub fn name_for(&self, code: u16) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    pub fn constructor_for(&self, name: &str) -> Option<Arc<dyn RecordConstructor>> {
        self.constructors.get(name).cloned()
    }

    /// Like [`constructor_for`](Self::constructor_for), but unknown names get
    /// an opaque constructor carrying `fallback_code`.
    pub fn constructor_or_opaque(&self, name: &str, fallback_code: u16) -> Arc<dyn RecordConstructor> {
        self.constructor_for(name)
            .unwrap_or_else(|| Arc::new(OpaqueConstructor::new(name, fallback_code)))
    }

    /// Numeric declarations map to their canonical name ("UnknownType" when
    /// unregistered); names map to their code (0 when unregistered). Digit
    /// strings beyond the 16-bit range resolve to code 0 as "UnknownType".
    pub fn resolve_declared<'a>(&'a self, declared: &'a RuleType) -> ResolvedType<'a> {
        if let Some(code) = declared.numeric_code() {
            return ResolvedType {
                code,
                name: self.name_for(code).unwrap_or(UNKNOWN_TYPE_NAME),
            };
        }
        if declared.is_numeric() {
            return ResolvedType {
                code: 0,
                name: UNKNOWN_TYPE_NAME,
            };
        }

        match declared {
            RuleType::Name(name) => ResolvedType {
                code: self.code_for(name).unwrap_or(0),
                name,
            },
            RuleType::Code(code) => ResolvedType {
                code: *code,
                name: UNKNOWN_TYPE_NAME,
            },
        }
    }

    /// Resolution used when a rule declares no type: it matches the query type.
    pub fn resolve_code(&self, code: u16) -> ResolvedType<'_> {
        ResolvedType {
            code,
            name: self.name_for(code).unwrap_or(UNKNOWN_TYPE_NAME),
        }
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for RecordTypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Default)]
pub struct RecordTypeRegistryBuilder {
    constructors: HashMap<String, Arc<dyn RecordConstructor>>,
    names: HashMap<u16, String>,
}

impl RecordTypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard_types(mut self) -> Self {
        for (name, code, kind) in STANDARD_TYPES {
            let ctor: Arc<dyn RecordConstructor> = match kind {
                Some(kind) => Arc::new(StandardConstructor::new(*name, *code, *kind)),
                None => Arc::new(OpaqueConstructor::new(*name, *code)),
            };
            self.insert(ctor);
        }
        self
    }

    /// Adds an extension type. Reusing a registered name or code is an error.
    /// Names are case-sensitive.
    pub fn register(mut self, ctor: Arc<dyn RecordConstructor>) -> Result<Self, DomainError> {
        let name = ctor.type_name().to_string();
        if self.constructors.contains_key(&name) {
            return Err(DomainError::DuplicateRecordType(name));
        }
        if let Some(existing) = self.names.get(&ctor.type_code()) {
            return Err(DomainError::DuplicateRecordType(format!(
                "{} (code {} already used by {})",
                name,
                ctor.type_code(),
                existing
            )));
        }
        self.insert(ctor);
        Ok(self)
    }

    fn insert(&mut self, ctor: Arc<dyn RecordConstructor>) {
        let name = ctor.type_name().to_string();
        self.names.insert(ctor.type_code(), name.clone());
        self.constructors.insert(name, ctor);
    }

    pub fn build(self) -> RecordTypeRegistry {
        RecordTypeRegistry {
            constructors: self.constructors,
            names: self.names,
        }
    }
}
