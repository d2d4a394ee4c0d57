use async_trait::async_trait;
use dnsroute_domain::{DomainError, RoutingRule};
use std::time::SystemTime;

/// Where routing rules come from.
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn load(&self) -> Result<Vec<RoutingRule>, DomainError>;

    /// Modification time of the backing store, if it has one. Used to skip
    /// reloads when nothing changed.
    async fn last_modified(&self) -> Option<SystemTime> {
        None
    }

    fn describe(&self) -> String;
}
