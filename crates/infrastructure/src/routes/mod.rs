pub mod file_source;

pub use file_source::{parse_rules, FileRouteSource, InlineRouteSource, RuleFileFormat};
