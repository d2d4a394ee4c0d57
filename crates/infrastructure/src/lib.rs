//! dnsroute infrastructure: wire codec, transports, rule loading, script
//! hooks and host address discovery.
pub mod dns;
pub mod routes;
pub mod scripts;
pub mod system;
