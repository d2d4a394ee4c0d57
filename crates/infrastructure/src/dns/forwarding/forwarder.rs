use crate::dns::transport::{DnsTransport, TcpTransport, UdpTransport};
use crate::dns::wire;
use async_trait::async_trait;
use dnsroute_application::ports::UpstreamForwarder;
use dnsroute_domain::DomainError;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Relays unrouted queries to upstream resolvers, trying each server in
/// order until one answers.
pub struct DnsForwarder {
    servers: Vec<SocketAddr>,
    timeout: Duration,
}

impl DnsForwarder {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self { servers, timeout }
    }

    /// Sends `query` under a fresh ID and checks the reply carries it back.
    /// Truncated UDP replies are retried over TCP.
    async fn query_server(&self, server: SocketAddr, query: &[u8]) -> Result<Vec<u8>, DomainError> {
        let upstream_id = fastrand::u16(..);
        let mut outbound = query.to_vec();
        wire::set_id(&mut outbound, upstream_id);

        let mut response = UdpTransport::new(server).send(&outbound, self.timeout).await?;
        if is_truncated(&response.bytes) {
            debug!(server = %server, "Truncated upstream reply, retrying over TCP");
            response = TcpTransport::new(server).send(&outbound, self.timeout).await?;
        }

        if wire::message_id(&response.bytes) != Some(upstream_id) {
            return Err(DomainError::TransportError {
                server: server.to_string(),
                reason: "response ID does not match query".to_string(),
            });
        }

        let message = Message::from_vec(&response.bytes).map_err(|e| DomainError::TransportError {
            server: server.to_string(),
            reason: format!("unparsable response: {}", e),
        })?;

        debug!(
            server = %server,
            protocol = response.protocol_used,
            rcode = ?message.response_code(),
            answers = message.answers().len(),
            "Upstream response received"
        );

        Ok(response.bytes)
    }
}

#[async_trait]
impl UpstreamForwarder for DnsForwarder {
    async fn forward(&self, query_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let client_id = wire::message_id(query_bytes)
            .ok_or_else(|| DomainError::InvalidDnsMessage("query shorter than header".to_string()))?;

        let mut last_error = DomainError::NoUpstreamServers;

        for server in &self.servers {
            match self.query_server(*server, query_bytes).await {
                Ok(mut response) => {
                    wire::set_id(&mut response, client_id);
                    return Ok(response);
                }
                Err(e) => {
                    warn!(server = %server, error = %e, "Upstream server failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn is_truncated(message: &[u8]) -> bool {
    wire::Header::peek(message).is_some_and(|h| h.is_truncated())
}
