use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::errors::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Servers that receive queries no rule answers. Empty means NXDOMAIN.
    #[serde(default = "default_upstream_servers")]
    pub upstream_servers: Vec<String>,

    /// Per-server upstream timeout in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Deadline for route resolution, script hooks included, in milliseconds.
    #[serde(default = "default_route_timeout_ms")]
    pub route_timeout_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: default_upstream_servers(),
            query_timeout_ms: default_query_timeout_ms(),
            route_timeout_ms: default_route_timeout_ms(),
        }
    }
}

impl DnsConfig {
    /// Parses `upstream_servers`; entries without a port use 53.
    pub fn upstream_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.upstream_servers
            .iter()
            .map(|raw| {
                let raw = raw.trim();
                raw.parse::<SocketAddr>()
                    .or_else(|_| raw.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, 53)))
                    .map_err(|_| {
                        ConfigError::Validation(format!("Invalid upstream server '{}'", raw))
                    })
            })
            .collect()
    }
}

fn default_upstream_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string()]
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_route_timeout_ms() -> u64 {
    1000
}
