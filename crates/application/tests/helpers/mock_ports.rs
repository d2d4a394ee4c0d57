#![allow(dead_code)]

use async_trait::async_trait;
use dnsroute_application::ports::{
    RouteSource, ScriptCall, ScriptCatalog, ScriptHook, ScriptOutcome, UpstreamForwarder,
};
use dnsroute_application::routing::{RecordTypeRegistry, RouteTable, RuleSet};
use dnsroute_application::use_cases::RouteResolver;
use dnsroute_domain::{DomainError, RoutingRule, SubstitutionContext};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

pub const SERVICE_IPV4: Ipv4Addr = Ipv4Addr::new(10, 1, 2, 3);

pub fn test_context() -> Arc<SubstitutionContext> {
    Arc::new(SubstitutionContext::new(
        "svc.example.com",
        SERVICE_IPV4,
        "fd00::1:2:3".parse().unwrap(),
    ))
}

pub fn resolver_with(rules: Vec<RoutingRule>, scripts: MockScriptCatalog) -> RouteResolver {
    let table = RouteTable::new(RuleSet::compile(&rules).unwrap());
    RouteResolver::new(
        Arc::new(table),
        Arc::new(RecordTypeRegistry::standard()),
        Arc::new(scripts),
        test_context(),
    )
}

pub fn resolver(rules: Vec<RoutingRule>) -> RouteResolver {
    resolver_with(rules, MockScriptCatalog::new())
}

/// What a [`RecordingHook`] saw on its last invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub query_name: String,
    pub query_class: u16,
    pub query_type: u16,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

/// Returns a fixed outcome and records every call.
pub struct RecordingHook {
    outcome: ScriptOutcome,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl RecordingHook {
    pub fn returning(outcome: ScriptOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub fn slow(outcome: ScriptOutcome, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScriptHook for RecordingHook {
    fn invoke(&self, call: &ScriptCall<'_>) -> ScriptOutcome {
        self.calls.lock().unwrap().push(RecordedCall {
            query_name: call.query_name.to_string(),
            query_class: call.query_class,
            query_type: call.query_type,
            args: call.args.to_vec(),
            kwargs: call.kwargs.clone(),
        });
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.outcome.clone()
    }
}

#[derive(Clone, Default)]
pub struct MockScriptCatalog {
    hooks: Arc<RwLock<HashMap<String, Arc<dyn ScriptHook>>>>,
}

impl MockScriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(self, reference: &str, hook: Arc<dyn ScriptHook>) -> Self {
        self.hooks
            .write()
            .unwrap()
            .insert(reference.to_string(), hook);
        self
    }
}

impl ScriptCatalog for MockScriptCatalog {
    fn lookup(&self, reference: &str) -> Result<Arc<dyn ScriptHook>, DomainError> {
        self.hooks
            .read()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| DomainError::ScriptNotFound(reference.to_string()))
    }
}

#[derive(Clone)]
pub struct MockUpstreamForwarder {
    response: Arc<RwLock<Result<Vec<u8>, DomainError>>>,
    forwarded: Arc<AtomicU64>,
    last_query: Arc<RwLock<Option<Vec<u8>>>>,
}

impl MockUpstreamForwarder {
    pub fn responding(bytes: Vec<u8>) -> Self {
        Self {
            response: Arc::new(RwLock::new(Ok(bytes))),
            forwarded: Arc::new(AtomicU64::new(0)),
            last_query: Arc::new(RwLock::new(None)),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Arc::new(RwLock::new(Err(DomainError::TransportTimeout {
                server: "192.0.2.53:53".to_string(),
            }))),
            forwarded: Arc::new(AtomicU64::new(0)),
            last_query: Arc::new(RwLock::new(None)),
        }
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn last_query(&self) -> Option<Vec<u8>> {
        self.last_query.read().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamForwarder for MockUpstreamForwarder {
    async fn forward(&self, query_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        *self.last_query.write().unwrap() = Some(query_bytes.to_vec());
        self.response.read().unwrap().clone()
    }
}

#[derive(Clone)]
pub struct MockRouteSource {
    rules: Arc<RwLock<Result<Vec<RoutingRule>, DomainError>>>,
    modified: Arc<RwLock<Option<SystemTime>>>,
    loads: Arc<AtomicU64>,
}

impl MockRouteSource {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(Ok(rules))),
            modified: Arc::new(RwLock::new(None)),
            loads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_rules(&self, rules: Vec<RoutingRule>) {
        *self.rules.write().unwrap() = Ok(rules);
    }

    pub fn set_error(&self, error: DomainError) {
        *self.rules.write().unwrap() = Err(error);
    }

    pub fn set_modified(&self, modified: SystemTime) {
        *self.modified.write().unwrap() = Some(modified);
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RouteSource for MockRouteSource {
    async fn load(&self) -> Result<Vec<RoutingRule>, DomainError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.rules.read().unwrap().clone()
    }

    async fn last_modified(&self) -> Option<SystemTime> {
        *self.modified.read().unwrap()
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
