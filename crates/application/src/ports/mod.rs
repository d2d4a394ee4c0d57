mod route_source;
mod script_hook;
mod upstream_forwarder;

pub use route_source::RouteSource;
pub use script_hook::{ScriptCall, ScriptCatalog, ScriptHook, ScriptOutcome};
pub use upstream_forwarder::UpstreamForwarder;
