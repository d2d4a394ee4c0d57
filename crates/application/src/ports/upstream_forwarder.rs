use async_trait::async_trait;
use dnsroute_domain::DomainError;

/// Sends a query no rule answered to an upstream resolver.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// Forwards the raw query message and returns the raw response message.
    async fn forward(&self, query_bytes: &[u8]) -> Result<Vec<u8>, DomainError>;
}
