mod dns;
mod routes;

pub use dns::DnsServices;
pub use routes::RouteServices;
