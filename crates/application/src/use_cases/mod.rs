pub mod dns;
pub mod routes;

pub use dns::{HandleDnsQueryUseCase, QueryOutcome};
pub use routes::{ReloadRoutesUseCase, RouteResolver};
