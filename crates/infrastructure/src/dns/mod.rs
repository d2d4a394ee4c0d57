pub mod forwarding;
pub mod server;
pub mod transport;
pub mod wire;

pub use forwarding::DnsForwarder;
pub use server::{DnsServerHandler, Protocol};
