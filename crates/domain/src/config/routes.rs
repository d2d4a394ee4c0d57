use serde::{Deserialize, Serialize};

use crate::routing_rule::RoutingRule;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutesConfig {
    /// JSON or TOML rule file, picked by extension.
    #[serde(default)]
    pub file: Option<String>,

    /// How often the rule file is checked for changes. 0 disables reloading.
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,

    /// Rules declared inline; evaluated before the rules from `file`.
    #[serde(default)]
    pub rules: Vec<RoutingRule>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            file: None,
            reload_interval_secs: default_reload_interval(),
            rules: Vec::new(),
        }
    }
}

fn default_reload_interval() -> u64 {
    5
}
