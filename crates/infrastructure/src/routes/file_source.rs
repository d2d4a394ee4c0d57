//! Rule sources backed by the config file and a standalone rules file.
//!
//! A rules file is either JSON (a bare array of rules, or an object with a
//! `routes` array) or TOML (`[[routes]]` tables), chosen by extension.

use async_trait::async_trait;
use dnsroute_application::ports::RouteSource;
use dnsroute_domain::{DomainError, RoutingRule};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFileFormat {
    Json,
    Toml,
}

impl RuleFileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRuleFile {
    List(Vec<RoutingRule>),
    Table { routes: Vec<RoutingRule> },
}

#[derive(Deserialize)]
struct TomlRuleFile {
    #[serde(default)]
    routes: Vec<RoutingRule>,
}

pub fn parse_rules(text: &str, format: RuleFileFormat) -> Result<Vec<RoutingRule>, String> {
    match format {
        RuleFileFormat::Json => match serde_json::from_str::<JsonRuleFile>(text) {
            Ok(JsonRuleFile::List(routes)) | Ok(JsonRuleFile::Table { routes }) => Ok(routes),
            Err(e) => Err(e.to_string()),
        },
        RuleFileFormat::Toml => toml::from_str::<TomlRuleFile>(text)
            .map(|file| file.routes)
            .map_err(|e| e.to_string()),
    }
}

/// Rules read from a file on every load, after any inline rules.
pub struct FileRouteSource {
    path: PathBuf,
    format: RuleFileFormat,
    inline: Vec<RoutingRule>,
}

impl FileRouteSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let format = RuleFileFormat::from_path(&path).ok_or_else(|| DomainError::RouteSourceError {
            source_name: path.display().to_string(),
            reason: "unsupported extension, expected .json or .toml".to_string(),
        })?;
        Ok(Self {
            path,
            format,
            inline: Vec::new(),
        })
    }

    /// Rules evaluated ahead of the file's rules.
    pub fn with_inline_rules(mut self, rules: Vec<RoutingRule>) -> Self {
        self.inline = rules;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl Into<String>) -> DomainError {
        DomainError::RouteSourceError {
            source_name: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RouteSource for FileRouteSource {
    async fn load(&self) -> Result<Vec<RoutingRule>, DomainError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.error(e.to_string()))?;
        let file_rules = parse_rules(&text, self.format).map_err(|e| self.error(e))?;

        debug!(
            path = %self.path.display(),
            inline = self.inline.len(),
            file = file_rules.len(),
            "Rules file parsed"
        );

        let mut rules = Vec::with_capacity(self.inline.len() + file_rules.len());
        rules.extend(self.inline.iter().cloned());
        rules.extend(file_rules);
        Ok(rules)
    }

    async fn last_modified(&self) -> Option<SystemTime> {
        tokio::fs::metadata(&self.path).await.ok()?.modified().ok()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rules declared directly in the main configuration.
pub struct InlineRouteSource {
    rules: Vec<RoutingRule>,
    loaded_at: SystemTime,
}

impl InlineRouteSource {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self {
            rules,
            loaded_at: SystemTime::now(),
        }
    }
}

#[async_trait]
impl RouteSource for InlineRouteSource {
    async fn load(&self) -> Result<Vec<RoutingRule>, DomainError> {
        Ok(self.rules.clone())
    }

    /// Inline rules never change once the process has started.
    async fn last_modified(&self) -> Option<SystemTime> {
        Some(self.loaded_at)
    }

    fn describe(&self) -> String {
        "inline configuration".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnsroute_domain::RuleType;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(RuleFileFormat::from_path(Path::new("r.JSON")), Some(RuleFileFormat::Json));
        assert_eq!(RuleFileFormat::from_path(Path::new("r.toml")), Some(RuleFileFormat::Toml));
        assert_eq!(RuleFileFormat::from_path(Path::new("rules")), None);
    }

    #[test]
    fn test_json_array_and_table() {
        let array = r#"[{"route": "^a\\.", "type": "A", "response": "192.0.2.1"}]"#;
        let table = r#"{"routes": [{"route": "^b\\."}, {"route": "^c\\."}]}"#;

        assert_eq!(parse_rules(array, RuleFileFormat::Json).unwrap().len(), 1);
        let rules = parse_rules(table, RuleFileFormat::Json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].pattern, "^c\\.");
    }

    #[test]
    fn test_toml_routes() {
        let text = r#"
            [[routes]]
            pattern = '^(\w+)\.lab$'
            type = "CNAME"
            response = "${1}.internal"

            [[routes]]
            route = "caa"
            type = 257
            response = '0 issue "letsencrypt.org"'
        "#;

        let rules = parse_rules(text, RuleFileFormat::Toml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].rule_type, Some(RuleType::Code(257)));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(parse_rules("{not json", RuleFileFormat::Json).is_err());
        assert!(parse_rules("[[routes]]\nttl = 1", RuleFileFormat::Toml).is_err());
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        assert!(matches!(
            FileRouteSource::new("/tmp/rules.yaml"),
            Err(DomainError::RouteSourceError { .. })
        ));
    }
}
