pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod routes;
pub mod scripts;
pub mod server;
pub mod service;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
pub use routes::RoutesConfig;
pub use scripts::ScriptsConfig;
pub use server::ServerConfig;
pub use service::ServiceConfig;
