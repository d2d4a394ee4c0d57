use dnsroute_application::routing::RouteTable;
use dnsroute_application::use_cases::ReloadRoutesUseCase;
use dnsroute_jobs::{JobRunner, RouteReloadJob};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

mod helpers;
use helpers::{rules, MockRouteSource};

fn make_route_reload_job(source: Arc<MockRouteSource>) -> RouteReloadJob {
    let routes = Arc::new(RouteTable::empty());
    let reload = Arc::new(ReloadRoutesUseCase::new(source, routes));
    RouteReloadJob::new(reload).with_interval(1)
}

#[tokio::test]
async fn test_job_runner_empty_starts_cleanly() {
    let handles = JobRunner::new().start().await;
    assert!(handles.is_empty());
}

#[tokio::test]
async fn test_job_runner_default_is_empty() {
    let handles = JobRunner::default().start().await;
    assert!(handles.is_empty());
}

#[tokio::test]
async fn test_job_runner_with_route_reload() {
    let source = Arc::new(MockRouteSource::new(rules(&["^a\\."])));
    let job = make_route_reload_job(source);

    let handles = JobRunner::new().with_route_reload(job).start().await;
    sleep(Duration::from_millis(10)).await;

    assert_eq!(handles.len(), 1);
    assert!(!handles[0].is_finished());
    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn test_job_runner_with_shutdown_token() {
    let source = Arc::new(MockRouteSource::new(rules(&["^a\\."])));
    let token = CancellationToken::new();

    let handles = JobRunner::new()
        .with_route_reload(make_route_reload_job(source))
        .with_shutdown_token(token.clone())
        .start()
        .await;
    sleep(Duration::from_millis(10)).await;

    token.cancel();
    for handle in handles {
        assert!(handle.await.is_ok());
    }
}
