pub mod registry;
pub mod rule_set;
pub mod standard_records;

pub use registry::{RecordTypeRegistry, RecordTypeRegistryBuilder, ResolvedType, UNKNOWN_TYPE_NAME};
pub use rule_set::{CompiledRule, RouteTable, RuleSet, ScriptBinding};
pub use standard_records::{NativeKind, StandardConstructor, StandardValue};
