use dnsroute_infrastructure::dns::{DnsServerHandler, Protocol};
use hickory_server::ServerFuture;
use socket2::{Domain, Protocol as SocketProtocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const UDP_RECV_BUFFER: usize = 4096;

pub struct ListenerOptions {
    pub bind_addr: SocketAddr,
    pub num_workers: usize,
    pub tcp_enabled: bool,
    pub tcp_idle_timeout: Duration,
}

/// Runs UDP workers (and TCP listeners when enabled) until `shutdown` fires.
/// Each worker owns its own SO_REUSEPORT socket; TCP connections are served
/// by hickory's `ServerFuture`.
pub async fn start_dns_server(
    options: ListenerOptions,
    handler: Arc<DnsServerHandler>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr = options.bind_addr;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let num_workers = options.num_workers.max(1);

    info!(
        bind_address = %socket_addr,
        num_workers,
        tcp = options.tcp_enabled,
        "Starting DNS server"
    );

    let mut join_set: JoinSet<()> = JoinSet::new();

    for i in 0..num_workers {
        let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
        let handler_udp = Arc::clone(&handler);
        let shutdown_udp = shutdown.clone();
        join_set.spawn(async move {
            run_udp_worker(udp_socket, handler_udp, i, shutdown_udp).await;
        });

        if options.tcp_enabled {
            let tcp_listener = create_tcp_listener(domain, socket_addr)?;
            let handler_tcp = (*handler).clone();
            let shutdown_tcp = shutdown.clone();
            let idle = options.tcp_idle_timeout;
            join_set.spawn(async move {
                let mut server = ServerFuture::new(handler_tcp);
                server.register_listener(tcp_listener, idle);
                tokio::select! {
                    _ = shutdown_tcp.cancelled() => {}
                    result = server.block_until_done() => {
                        if let Err(e) = result {
                            error!(worker = i, error = %e, "TCP DNS worker error");
                        }
                    }
                }
            });
        }
    }

    info!(workers = num_workers, address = %socket_addr, "DNS server ready");

    while join_set.join_next().await.is_some() {}

    info!("DNS server stopped");
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    worker_id: usize,
    shutdown: CancellationToken,
) {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut recv_buf) => match received {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // ICMP port unreachable from an earlier reply surfaces here on some platforms.
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => {
                    error!(worker = worker_id, error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let handler = Arc::clone(&handler);
        let socket = Arc::clone(&socket);
        let request: Arc<[u8]> = Arc::from(&recv_buf[..n]);
        tokio::spawn(async move {
            if let Some(response) = handler.handle(&request, from, Protocol::Udp).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "UDP send failed");
                }
            }
        });
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(SocketProtocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(SocketProtocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
