//! dnsroute domain layer
pub mod answer;
pub mod caa;
pub mod config;
pub mod errors;
pub mod record_value;
pub mod route_query;
pub mod routing_rule;
pub mod substitution;

pub use answer::AnswerRecord;
pub use caa::{CaaConstructor, CaaValue, CAA_TYPE_CODE};
pub use config::{CliOverrides, Config};
pub use errors::DomainError;
pub use record_value::{OpaqueConstructor, OpaqueValue, RecordConstructor, RecordValue};
pub use route_query::{RouteQuery, DNS_CLASS_IN};
pub use routing_rule::{ResponseValues, RoutingRule, RuleClass, RuleTtl, RuleType};
pub use substitution::SubstitutionContext;
