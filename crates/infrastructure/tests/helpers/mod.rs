mod dns_server_mock;
mod queries;

pub use dns_server_mock::MockDnsServer;
pub use queries::*;
