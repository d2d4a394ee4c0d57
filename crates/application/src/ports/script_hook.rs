use dnsroute_domain::DomainError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Arguments handed to a script hook for one query.
#[derive(Debug, Clone, Copy)]
pub struct ScriptCall<'a> {
    /// Query name as received, not lower-cased.
    pub query_name: &'a str,
    pub query_class: u16,
    pub query_type: u16,
    pub args: &'a [Value],
    pub kwargs: &'a BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Response values, in order. A single value is a one-element list.
    Values(Vec<String>),
    Failed(String),
}

impl ScriptOutcome {
    pub fn single(value: impl Into<String>) -> Self {
        ScriptOutcome::Values(vec![value.into()])
    }
}

/// Computes response values for a rule at query time.
///
/// Invocation is synchronous; callers bound it with their own deadline.
pub trait ScriptHook: Send + Sync {
    fn invoke(&self, call: &ScriptCall<'_>) -> ScriptOutcome;
}

/// Resolves a rule's `script` reference to a callable hook.
pub trait ScriptCatalog: Send + Sync {
    fn lookup(&self, reference: &str) -> Result<Arc<dyn ScriptHook>, DomainError>;
}
