pub mod address;

pub use address::{discover_ipv4, discover_ipv6, resolve_service_addresses};
