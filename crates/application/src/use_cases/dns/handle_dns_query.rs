use crate::ports::UpstreamForwarder;
use crate::use_cases::routes::RouteResolver;
use dnsroute_domain::{AnswerRecord, RouteQuery};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// What the transport should send back for a query.
#[derive(Debug)]
pub enum QueryOutcome {
    /// A rule produced records.
    Answered(Vec<AnswerRecord>),
    /// Raw response from an upstream resolver.
    Forwarded(Vec<u8>),
    NxDomain,
    ServFail,
}

impl QueryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOutcome::Answered(_) => "ROUTED",
            QueryOutcome::Forwarded(_) => "FORWARDED",
            QueryOutcome::NxDomain => "NXDOMAIN",
            QueryOutcome::ServFail => "SERVFAIL",
        }
    }
}

pub struct HandleDnsQueryUseCase {
    resolver: Arc<RouteResolver>,
    upstream: Option<Arc<dyn UpstreamForwarder>>,
    route_timeout: Duration,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<RouteResolver>, route_timeout: Duration) -> Self {
        Self {
            resolver,
            upstream: None,
            route_timeout,
        }
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn UpstreamForwarder>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Answers from the routing rules, falling back to upstream with the
    /// original `raw_query` when no rule produces records.
    pub async fn execute(&self, query: &RouteQuery, raw_query: &[u8]) -> QueryOutcome {
        let start = Instant::now();
        let answers = self.resolve_with_deadline(query).await;

        if !answers.is_empty() {
            debug!(
                domain = %query.name,
                record_type = query.record_type,
                answers = answers.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "Query routed"
            );
            return QueryOutcome::Answered(answers);
        }

        self.fallback(query, raw_query).await
    }

    /// The no-records path: upstream when configured, otherwise NXDOMAIN.
    /// Also taken when routed records cannot be encoded.
    pub async fn fallback(&self, query: &RouteQuery, raw_query: &[u8]) -> QueryOutcome {
        let Some(upstream) = &self.upstream else {
            return QueryOutcome::NxDomain;
        };

        match upstream.forward(raw_query).await {
            Ok(response) => QueryOutcome::Forwarded(response),
            Err(e) => {
                warn!(domain = %query.name, error = %e, "Upstream forwarding failed");
                QueryOutcome::ServFail
            }
        }
    }

    /// Script hooks block, so resolution runs on the blocking pool. A
    /// resolution that misses the deadline counts as no match.
    async fn resolve_with_deadline(&self, query: &RouteQuery) -> Vec<AnswerRecord> {
        let resolver = Arc::clone(&self.resolver);
        let owned = query.clone();
        let task = tokio::task::spawn_blocking(move || resolver.resolve(&owned));

        match timeout(self.route_timeout, task).await {
            Ok(Ok(answers)) => answers,
            Ok(Err(e)) => {
                warn!(domain = %query.name, error = %e, "Route resolution task failed");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    domain = %query.name,
                    timeout_ms = self.route_timeout.as_millis() as u64,
                    "Route resolution timed out"
                );
                Vec::new()
            }
        }
    }
}
