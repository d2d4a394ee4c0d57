#![allow(dead_code)]

use async_trait::async_trait;
use dnsroute_application::ports::RouteSource;
use dnsroute_domain::{DomainError, RoutingRule};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

pub struct MockRouteSource {
    rules: Arc<RwLock<Result<Vec<RoutingRule>, DomainError>>>,
    modified: Arc<RwLock<Option<SystemTime>>>,
    loads: Arc<AtomicU64>,
}

impl MockRouteSource {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self {
            rules: Arc::new(RwLock::new(Ok(rules))),
            modified: Arc::new(RwLock::new(Some(SystemTime::UNIX_EPOCH))),
            loads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replaces the rules and bumps the modification time.
    pub fn update(&self, rules: Vec<RoutingRule>) {
        *self.rules.write().unwrap() = Ok(rules);
        self.touch();
    }

    pub fn fail_with(&self, error: DomainError) {
        *self.rules.write().unwrap() = Err(error);
        self.touch();
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        let mut modified = self.modified.write().unwrap();
        let next = modified.unwrap_or(SystemTime::UNIX_EPOCH) + Duration::from_secs(1);
        *modified = Some(next);
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

pub fn rules(patterns: &[&str]) -> Vec<RoutingRule> {
    patterns.iter().map(|p| RoutingRule::new(*p)).collect()
}
