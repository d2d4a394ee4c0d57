pub mod route_reload;
pub mod runner;

pub use route_reload::RouteReloadJob;
pub use runner::JobRunner;
