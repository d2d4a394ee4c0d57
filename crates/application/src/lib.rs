//! dnsroute application layer: the route resolver and the ports it drives.
pub mod ports;
pub mod routing;
pub mod use_cases;
