use clap::Parser;
use dnsroute_domain::CliOverrides;
use dnsroute_jobs::JobRunner;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "dnsroute")]
#[command(version)]
#[command(about = "dnsroute - rule-driven DNS responder with upstream fallback")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Routing rule file (JSON or TOML)
    #[arg(short = 'r', long, value_name = "FILE")]
    routes: Option<String>,

    /// Domain substituted for {domain} in responses
    #[arg(long)]
    domain: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        routes_file: cli.routes.clone(),
        domain: cli.domain.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting dnsroute v{}", env!("CARGO_PKG_VERSION"));

    let route_services = di::RouteServices::new(&config.routes).await?;
    let dns_services = di::DnsServices::new(&config, route_services.routes.clone())?;

    info!(
        rules = dns_services.resolver.routes().len(),
        domain = %dns_services.resolver.context().domain,
        "Route resolver ready"
    );

    let shutdown = CancellationToken::new();

    let mut jobs = JobRunner::new().with_shutdown_token(shutdown.clone());
    if let Some(job) = route_services.reload_job() {
        jobs = jobs.with_route_reload(job);
    }
    jobs.start().await;

    let bind_ip: IpAddr = config.server.bind_address.parse()?;
    let bind_addr = SocketAddr::new(bind_ip, config.server.dns_port);
    let options = server::ListenerOptions {
        bind_addr,
        num_workers: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        tcp_enabled: config.server.tcp_enabled,
        tcp_idle_timeout: Duration::from_secs(config.server.tcp_idle_timeout),
    };

    let server_shutdown = shutdown.clone();
    let handler = dns_services.handler.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = server::start_dns_server(options, handler, server_shutdown.clone()).await {
            error!(error = %e, "DNS server error");
            server_shutdown.cancel();
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
    let _ = server.await;

    info!("Server shutdown complete");
    Ok(())
}
