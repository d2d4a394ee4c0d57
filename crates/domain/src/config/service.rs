use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use super::errors::ConfigError;

/// Identity of this service as exposed to rule templates.
///
/// Addresses left unset are discovered from the host at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub ipv4: Option<String>,

    #[serde(default)]
    pub ipv6: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            ipv4: None,
            ipv6: None,
        }
    }
}

impl ServiceConfig {
    pub fn ipv4_addr(&self) -> Result<Option<Ipv4Addr>, ConfigError> {
        self.ipv4
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|_| {
                    ConfigError::Validation(format!("service.ipv4 '{}' is not an IPv4 address", raw))
                })
            })
            .transpose()
    }

    pub fn ipv6_addr(&self) -> Result<Option<Ipv6Addr>, ConfigError> {
        self.ipv6
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|_| {
                    ConfigError::Validation(format!("service.ipv6 '{}' is not an IPv6 address", raw))
                })
            })
            .transpose()
    }
}

fn default_domain() -> String {
    "localhost".to_string()
}
