use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::route_query::DNS_CLASS_IN;

pub const DEFAULT_RULE_TTL: u32 = 60;

/// A declarative "if the query matches, answer with this" rule.
///
/// Rules are evaluated in list order and the first eligible rule wins.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RoutingRule {
    /// Regular expression searched (unanchored) in the lower-cased query name.
    #[serde(alias = "route")]
    pub pattern: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<RuleClass>,

    /// Matched query type. When absent the rule matches any query type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,

    /// Record type to construct, when it differs from the matched type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<RuleTtl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseValues>,

    #[serde(default)]
    pub random: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kwargs: BTreeMap<String, Value>,
}

impl RoutingRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            class: None,
            rule_type: None,
            record: None,
            ttl: None,
            response: None,
            random: false,
            script: None,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, rule_type: RuleType) -> Self {
        self.rule_type = Some(rule_type);
        self
    }

    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(RuleTtl::Seconds(ttl));
        self
    }

    pub fn with_class(mut self, class: RuleClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_response(mut self, response: ResponseValues) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_random(mut self, random: bool) -> Self {
        self.random = random;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }
}

/// Declared record type: either a numeric code or a type name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleType {
    Code(u16),
    Name(String),
}

impl RuleType {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Digit-only names (`"257"`) are numeric codes written as strings.
    /// `None` for names and for digit strings beyond the 16-bit range.
    pub fn numeric_code(&self) -> Option<u16> {
        match self {
            RuleType::Code(code) => Some(*code),
            RuleType::Name(name) if self.is_numeric() => name.parse().ok(),
            RuleType::Name(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            RuleType::Code(_) => true,
            RuleType::Name(name) => !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleClass {
    Code(u16),
    Name(String),
}

impl RuleClass {
    pub fn code(&self) -> Option<u16> {
        match self {
            RuleClass::Code(code) => Some(*code),
            RuleClass::Name(name) => class_code_for(name),
        }
    }
}

impl Default for RuleClass {
    fn default() -> Self {
        RuleClass::Code(DNS_CLASS_IN)
    }
}

pub fn class_code_for(name: &str) -> Option<u16> {
    if let Ok(code) = name.parse::<u16>() {
        return Some(code);
    }
    match name.to_ascii_uppercase().as_str() {
        "IN" => Some(1),
        "CS" => Some(2),
        "CH" => Some(3),
        "HS" => Some(4),
        "NONE" => Some(254),
        "ANY" | "*" => Some(255),
        _ => None,
    }
}

/// TTL as written in the rule file; older files carry it as a string.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleTtl {
    Seconds(u32),
    Text(String),
}

impl RuleTtl {
    pub fn seconds(&self) -> Option<u32> {
        match self {
            RuleTtl::Seconds(secs) => Some(*secs),
            RuleTtl::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResponseValues {
    One(String),
    Many(Vec<String>),
}

impl ResponseValues {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ResponseValues::One(value) => vec![value],
            ResponseValues::Many(values) => values,
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.clone().into_vec()
    }

    pub fn len(&self) -> usize {
        match self {
            ResponseValues::One(_) => 1,
            ResponseValues::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for ResponseValues {
    fn from(value: &str) -> Self {
        ResponseValues::One(value.to_string())
    }
}

impl From<Vec<&str>> for ResponseValues {
    fn from(values: Vec<&str>) -> Self {
        ResponseValues::Many(values.into_iter().map(str::to_string).collect())
    }
}
