mod reload_routes;
mod resolve_route;

pub use reload_routes::ReloadRoutesUseCase;
pub use resolve_route::RouteResolver;
