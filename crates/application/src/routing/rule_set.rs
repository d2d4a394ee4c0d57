use arc_swap::ArcSwap;
use dnsroute_domain::{
    routing_rule::DEFAULT_RULE_TTL, DomainError, RoutingRule, RuleType, DNS_CLASS_IN,
};
use fancy_regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A rule's script reference and the arguments forwarded to it.
#[derive(Debug, Clone)]
pub struct ScriptBinding {
    pub reference: String,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

/// A validated rule, ready to be evaluated against queries.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Position in the rule list; reported in logs.
    pub index: usize,
    pub pattern_source: String,
    pub pattern: Regex,
    pub class: u16,
    pub declared_type: Option<RuleType>,
    pub record: Option<String>,
    pub ttl: u32,
    pub responses: Option<Vec<String>>,
    pub random: bool,
    pub script: Option<ScriptBinding>,
}

impl CompiledRule {
    pub fn compile(index: usize, rule: &RoutingRule) -> Result<Self, DomainError> {
        let pattern = RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                DomainError::invalid_rule(index, format!("bad pattern '{}': {}", rule.pattern, e))
            })?;

        let class = match &rule.class {
            None => DNS_CLASS_IN,
            Some(class) => class
                .code()
                .ok_or_else(|| DomainError::invalid_rule(index, format!("unknown class {:?}", class)))?,
        };

        let ttl = match &rule.ttl {
            None => DEFAULT_RULE_TTL,
            Some(ttl) => ttl
                .seconds()
                .ok_or_else(|| DomainError::invalid_rule(index, format!("ttl {:?} is not an integer", ttl)))?,
        };

        if let Some(RuleType::Name(name)) = &rule.rule_type {
            if name.trim().is_empty() {
                return Err(DomainError::invalid_rule(index, "empty type"));
            }
        }

        if matches!(&rule.record, Some(record) if record.trim().is_empty()) {
            return Err(DomainError::invalid_rule(index, "empty record type"));
        }

        let script = match &rule.script {
            Some(reference) if reference.trim().is_empty() => {
                return Err(DomainError::invalid_rule(index, "empty script reference"));
            }
            Some(reference) => Some(ScriptBinding {
                reference: reference.clone(),
                args: rule.args.clone(),
                kwargs: rule.kwargs.clone(),
            }),
            None => None,
        };

        let responses = rule.response.as_ref().map(|r| r.to_vec());

        if rule.random && script.is_none() && matches!(&responses, Some(values) if values.is_empty()) {
            return Err(DomainError::invalid_rule(
                index,
                "random needs at least one response value",
            ));
        }

        Ok(Self {
            index,
            pattern_source: rule.pattern.clone(),
            pattern,
            class,
            declared_type: rule.rule_type.clone(),
            record: rule.record.clone(),
            ttl,
            responses,
            random: rule.random,
            script,
        })
    }
}

/// An immutable, ordered list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles every rule; the first invalid rule fails the whole set.
    pub fn compile(rules: &[RoutingRule]) -> Result<Self, DomainError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::compile(index, rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CompiledRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Shared handle to the active rule set.
///
/// Readers take a snapshot for the whole resolution; a refresh swaps in a
/// new set without disturbing resolutions already in flight.
pub struct RouteTable {
    current: ArcSwap<RuleSet>,
}

impl RouteTable {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(rules),
        }
    }

    pub fn empty() -> Self {
        Self::new(RuleSet::empty())
    }

    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Installs `rules` and returns the set it replaced.
    pub fn replace(&self, rules: RuleSet) -> Arc<RuleSet> {
        self.current.swap(Arc::new(rules))
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}
