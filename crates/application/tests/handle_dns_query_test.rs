mod helpers;

use dnsroute_application::ports::ScriptOutcome;
use dnsroute_application::use_cases::{HandleDnsQueryUseCase, QueryOutcome};
use dnsroute_domain::{ResponseValues, RouteQuery, RoutingRule, RuleType};
use helpers::{
    resolver, resolver_with, MockScriptCatalog, MockUpstreamForwarder, RecordingHook,
};
use std::sync::Arc;
use std::time::Duration;

const RAW_QUERY: &[u8] = b"\x12\x34raw-query";
const TIMEOUT: Duration = Duration::from_millis(500);

fn routed_rules() -> Vec<RoutingRule> {
    vec![RoutingRule::new("^local\\.")
        .with_type(RuleType::name("A"))
        .with_response(ResponseValues::from("192.0.2.1"))]
}

#[tokio::test]
async fn test_matched_query_is_answered_locally() {
    let upstream = MockUpstreamForwarder::responding(b"upstream".to_vec());
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT)
        .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .execute(&RouteQuery::internet("local.example.com", 1), RAW_QUERY)
        .await;

    match outcome {
        QueryOutcome::Answered(answers) => assert_eq!(answers.len(), 1),
        other => panic!("expected Answered, got {:?}", other),
    }
    assert_eq!(upstream.forwarded(), 0);
}

#[tokio::test]
async fn test_unmatched_query_is_forwarded_verbatim() {
    let upstream = MockUpstreamForwarder::responding(b"upstream".to_vec());
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT)
        .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .execute(&RouteQuery::internet("elsewhere.example.com", 1), RAW_QUERY)
        .await;

    match outcome {
        QueryOutcome::Forwarded(bytes) => assert_eq!(bytes, b"upstream".to_vec()),
        other => panic!("expected Forwarded, got {:?}", other),
    }
    assert_eq!(upstream.forwarded(), 1);
    assert_eq!(upstream.last_query().unwrap(), RAW_QUERY.to_vec());
}

#[tokio::test]
async fn test_unmatched_query_without_upstream_is_nxdomain() {
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT);

    let outcome = use_case
        .execute(&RouteQuery::internet("elsewhere.example.com", 1), RAW_QUERY)
        .await;

    assert!(matches!(outcome, QueryOutcome::NxDomain));
}

#[tokio::test]
async fn test_upstream_failure_is_servfail() {
    let upstream = MockUpstreamForwarder::failing();
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT)
        .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .execute(&RouteQuery::internet("elsewhere.example.com", 1), RAW_QUERY)
        .await;

    assert!(matches!(outcome, QueryOutcome::ServFail));
    assert_eq!(outcome.as_str(), "SERVFAIL");
}

#[tokio::test]
async fn test_slow_script_counts_as_no_match() {
    let hook = RecordingHook::slow(ScriptOutcome::single("192.0.2.5"), Duration::from_millis(300));
    let scripts = MockScriptCatalog::new().with_hook("slow", hook.clone());
    let rules = vec![RoutingRule::new("^slow\\.")
        .with_type(RuleType::name("A"))
        .with_script("slow")];
    let upstream = MockUpstreamForwarder::responding(b"fallback".to_vec());
    let use_case = HandleDnsQueryUseCase::new(
        Arc::new(resolver_with(rules, scripts)),
        Duration::from_millis(20),
    )
    .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .execute(&RouteQuery::internet("slow.example.com", 1), RAW_QUERY)
        .await;

    assert!(matches!(outcome, QueryOutcome::Forwarded(_)));
    assert_eq!(upstream.forwarded(), 1);
}

#[tokio::test]
async fn test_failed_script_falls_back_to_upstream() {
    let hook = RecordingHook::returning(ScriptOutcome::Failed("exit status 1".to_string()));
    let scripts = MockScriptCatalog::new().with_hook("broken", hook);
    let rules = vec![RoutingRule::new("^dyn\\.")
        .with_type(RuleType::name("A"))
        .with_script("broken")];
    let upstream = MockUpstreamForwarder::responding(b"fallback".to_vec());
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver_with(rules, scripts)), TIMEOUT)
        .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .execute(&RouteQuery::internet("dyn.example.com", 1), RAW_QUERY)
        .await;

    assert!(matches!(outcome, QueryOutcome::Forwarded(_)));
}

#[tokio::test]
async fn test_fallback_skips_routing_even_for_matching_name() {
    let upstream = MockUpstreamForwarder::responding(b"upstream".to_vec());
    let use_case = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT)
        .with_upstream(Arc::new(upstream.clone()));

    let outcome = use_case
        .fallback(&RouteQuery::internet("local.example.com", 1), RAW_QUERY)
        .await;

    assert!(matches!(outcome, QueryOutcome::Forwarded(_)));
    assert_eq!(upstream.last_query().unwrap(), RAW_QUERY.to_vec());

    let local_only = HandleDnsQueryUseCase::new(Arc::new(resolver(routed_rules())), TIMEOUT);
    let outcome = local_only
        .fallback(&RouteQuery::internet("local.example.com", 1), RAW_QUERY)
        .await;
    assert!(matches!(outcome, QueryOutcome::NxDomain));
}
