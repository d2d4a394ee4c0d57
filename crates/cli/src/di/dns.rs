use dnsroute_application::routing::{RecordTypeRegistry, RouteTable};
use dnsroute_application::use_cases::{HandleDnsQueryUseCase, RouteResolver};
use dnsroute_domain::{Config, SubstitutionContext};
use dnsroute_infrastructure::dns::{DnsForwarder, DnsServerHandler};
use dnsroute_infrastructure::scripts::ScriptRegistry;
use dnsroute_infrastructure::system::resolve_service_addresses;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct DnsServices {
    pub resolver: Arc<RouteResolver>,
    pub handler: Arc<DnsServerHandler>,
}

impl DnsServices {
    pub fn new(config: &Config, routes: Arc<RouteTable>) -> anyhow::Result<Self> {
        let registry = Arc::new(RecordTypeRegistry::standard());
        let scripts = Arc::new(Self::build_script_registry(config));
        let context = Arc::new(Self::build_context(config)?);

        let resolver = Arc::new(RouteResolver::new(routes, registry, scripts, context));

        let mut use_case = HandleDnsQueryUseCase::new(
            Arc::clone(&resolver),
            Duration::from_millis(config.dns.route_timeout_ms),
        );

        let upstreams = config.dns.upstream_addrs()?;
        if upstreams.is_empty() {
            warn!("No upstream servers configured, unmatched queries get NXDOMAIN");
        } else {
            info!(servers = upstreams.len(), "Upstream fallback enabled");
            use_case = use_case.with_upstream(Arc::new(DnsForwarder::new(
                upstreams,
                Duration::from_millis(config.dns.query_timeout_ms),
            )));
        }

        let handler = Arc::new(DnsServerHandler::new(Arc::new(use_case)));

        Ok(Self { resolver, handler })
    }

    fn build_context(config: &Config) -> anyhow::Result<SubstitutionContext> {
        let (ipv4, ipv6) =
            resolve_service_addresses(config.service.ipv4_addr()?, config.service.ipv6_addr()?);

        info!(
            domain = %config.service.domain,
            ipv4 = %ipv4,
            ipv6 = %ipv6,
            "Service identity"
        );

        Ok(SubstitutionContext::new(
            config.service.domain.clone(),
            ipv4,
            ipv6,
        ))
    }

    /// Relative script references resolve against `scripts.directory`, or
    /// the rule file's directory when unset.
    fn build_script_registry(config: &Config) -> ScriptRegistry {
        ScriptRegistry::new(
            script_base_dir(config),
            Duration::from_millis(config.scripts.timeout_ms),
        )
    }
}

fn script_base_dir(config: &Config) -> Option<PathBuf> {
    config
        .scripts
        .directory
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| {
            config
                .routes
                .file
                .as_deref()
                .and_then(|file| Path::new(file).parent())
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
}
