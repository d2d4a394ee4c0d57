use serde::{Deserialize, Serialize};
use std::path::Path;

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::routes::RoutesConfig;
use super::scripts::ScriptsConfig;
use super::server::ServerConfig;
use super::service::ServiceConfig;

const LOCAL_CONFIG_PATH: &str = "dnsroute.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/dnsroute/config.toml";

/// Main configuration structure for dnsroute
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (port, bind address)
    #[serde(default)]
    pub server: ServerConfig,

    /// Domain and addresses substituted into rule templates
    #[serde(default)]
    pub service: ServiceConfig,

    /// Upstream fallback and deadlines
    #[serde(default)]
    pub dns: DnsConfig,

    /// Routing rules
    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dnsroute.toml in current directory
    /// 3. /etc/dnsroute/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(file) = overrides.routes_file {
            self.routes.file = Some(file);
        }
        if let Some(domain) = overrides.domain {
            self.service.domain = domain;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.server.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind_address '{}' is not an IP address",
                self.server.bind_address
            )));
        }

        if self.service.domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "service.domain cannot be empty".to_string(),
            ));
        }

        self.service.ipv4_addr()?;
        self.service.ipv6_addr()?;
        self.dns.upstream_addrs()?;

        if self.dns.route_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dns.route_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.routes.file.is_none() && self.routes.rules.is_empty() {
            return Err(ConfigError::Validation(
                "No routes configured: set routes.file or add [[routes.rules]]".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|candidate| Path::new(candidate).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub routes_file: Option<String>,
    pub domain: Option<String>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    const SAMPLE: &str = r#"
        [server]
        dns_port = 5353

        [service]
        domain = "lab.example.com"
        ipv4 = "192.0.2.10"

        [dns]
        upstream_servers = ["9.9.9.9", "1.1.1.1:53"]

        [routes]
        file = "routes.json"

        [[routes.rules]]
        pattern = '^ns\d\.'
        type = "A"

        [logging]
        level = "debug"
        format = "json"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert_eq!(config.server.dns_port, 5353);
        assert!(config.server.tcp_enabled);
        assert_eq!(config.service.domain, "lab.example.com");
        assert_eq!(
            config.service.ipv4_addr().unwrap(),
            Some("192.0.2.10".parse().unwrap())
        );
        assert_eq!(config.service.ipv6_addr().unwrap(), None);
        assert_eq!(config.routes.rules.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upstream_without_port_defaults_to_53() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let addrs = config.dns.upstream_addrs().unwrap();
        assert_eq!(addrs[0], "9.9.9.9:53".parse().unwrap());
        assert_eq!(addrs[1], "1.1.1.1:53".parse().unwrap());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.dns_port, 53);
        assert_eq!(config.dns.upstream_servers, vec!["8.8.8.8:53"]);
        assert_eq!(config.routes.reload_interval_secs, 5);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_validate_rejects_missing_routes() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.service.ipv6 = Some("not-an-address".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_bind_address() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.server.bind_address = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_upstream() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.dns.upstream_servers = vec!["dns.google".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dnsroute.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(
            path.to_str(),
            CliOverrides {
                dns_port: Some(10053),
                routes_file: Some("other.toml".to_string()),
                log_level: Some("trace".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.server.dns_port, 10053);
        assert_eq!(config.routes.file.as_deref(), Some("other.toml"));
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.service.domain, "lab.example.com");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load(Some("/nonexistent/dnsroute.toml"), CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::FileRead(_, _))));
    }
}
