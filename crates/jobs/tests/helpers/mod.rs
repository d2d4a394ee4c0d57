mod mock_route_source;

pub use mock_route_source::*;
