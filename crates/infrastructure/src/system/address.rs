//! Discovery of the addresses the service answers with by default.
//!
//! A UDP socket "connected" to a public address reveals which local
//! address the kernel would route from. No packet is sent.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use tracing::{debug, warn};

const IPV4_ROUTE_TARGET: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);
const IPV6_ROUTE_TARGET: SocketAddr = SocketAddr::new(
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    53,
);

pub fn discover_ipv4() -> Option<Ipv4Addr> {
    match local_address((Ipv4Addr::UNSPECIFIED, 0).into(), IPV4_ROUTE_TARGET)? {
        IpAddr::V4(addr) if !addr.is_unspecified() => Some(addr),
        _ => None,
    }
}

pub fn discover_ipv6() -> Option<Ipv6Addr> {
    match local_address((Ipv6Addr::UNSPECIFIED, 0).into(), IPV6_ROUTE_TARGET)? {
        IpAddr::V6(addr) if !addr.is_unspecified() => Some(addr),
        _ => None,
    }
}

/// Configured addresses win; missing ones are discovered, falling back to
/// loopback when the host has no route.
pub fn resolve_service_addresses(
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
) -> (Ipv4Addr, Ipv6Addr) {
    let ipv4 = ipv4.or_else(discover_ipv4).unwrap_or_else(|| {
        warn!("No IPv4 address discovered, using loopback");
        Ipv4Addr::LOCALHOST
    });
    let ipv6 = ipv6.or_else(discover_ipv6).unwrap_or_else(|| {
        warn!("No IPv6 address discovered, using loopback");
        Ipv6Addr::LOCALHOST
    });

    debug!(ipv4 = %ipv4, ipv6 = %ipv6, "Service addresses resolved");
    (ipv4, ipv6)
}

fn local_address(bind: SocketAddr, target: SocketAddr) -> Option<IpAddr> {
    let socket = UdpSocket::bind(bind).ok()?;
    socket.connect(target).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}
