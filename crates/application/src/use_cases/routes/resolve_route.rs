use crate::ports::{ScriptCall, ScriptCatalog, ScriptOutcome};
use crate::routing::{CompiledRule, RecordTypeRegistry, ResolvedType, RouteTable, ScriptBinding};
use dnsroute_domain::{AnswerRecord, RouteQuery, SubstitutionContext};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Matches queries against the ordered rule list and synthesizes answers.
///
/// Resolution never fails: every error path is logged and collapses to an
/// empty answer list, which callers treat as "not ours".
pub struct RouteResolver {
    routes: Arc<RouteTable>,
    registry: Arc<RecordTypeRegistry>,
    scripts: Arc<dyn ScriptCatalog>,
    context: Arc<SubstitutionContext>,
}

impl RouteResolver {
    pub fn new(
        routes: Arc<RouteTable>,
        registry: Arc<RecordTypeRegistry>,
        scripts: Arc<dyn ScriptCatalog>,
        context: Arc<SubstitutionContext>,
    ) -> Self {
        Self {
            routes,
            registry,
            scripts,
            context,
        }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn context(&self) -> &SubstitutionContext {
        &self.context
    }

    /// First eligible rule wins; later rules are never consulted, even when
    /// the winning rule produces no records.
    pub fn resolve(&self, query: &RouteQuery) -> Vec<AnswerRecord> {
        let rules = self.routes.snapshot();
        let lookup_name = query.name.to_lowercase();

        for rule in rules.iter() {
            let captures = match rule.pattern.captures(&lookup_name) {
                Ok(Some(captures)) => captures,
                Ok(None) => continue,
                Err(e) => {
                    warn!(rule = rule.index, pattern = %rule.pattern_source, error = %e, "Pattern evaluation failed");
                    continue;
                }
            };

            if query.class != rule.class {
                continue;
            }

            let matched = match &rule.declared_type {
                Some(declared) => self.registry.resolve_declared(declared),
                None => self.registry.resolve_code(query.record_type),
            };
            if matched.code != query.record_type {
                continue;
            }

            debug!(
                rule = rule.index,
                pattern = %rule.pattern_source,
                domain = %query.name,
                record_type = matched.name,
                "Matched route"
            );

            let groups: Vec<Option<&str>> = (1..captures.len())
                .map(|i| captures.get(i).map(|m| m.as_str()))
                .collect();

            return self.synthesize(rule, query, matched, &groups);
        }

        Vec::new()
    }

    fn synthesize(
        &self,
        rule: &CompiledRule,
        query: &RouteQuery,
        matched: ResolvedType<'_>,
        groups: &[Option<&str>],
    ) -> Vec<AnswerRecord> {
        let (record_name, record_code) = match &rule.record {
            Some(record) => (record.as_str(), self.registry.code_for(record).unwrap_or(0)),
            None => (matched.name, query.record_type),
        };
        let constructor = self.registry.constructor_or_opaque(record_name, record_code);

        let Some(mut values) = self.response_values(rule, query, record_name) else {
            return Vec::new();
        };

        if rule.random {
            if values.is_empty() {
                debug!(rule = rule.index, "Random route has no values to choose from");
                return Vec::new();
            }
            let pick = fastrand::usize(..values.len());
            values = vec![values.swap_remove(pick)];
        }

        let mut answers = Vec::with_capacity(values.len());
        for template in &values {
            let rendered = self.context.render(template, groups);
            match constructor.construct(rendered.as_bytes()) {
                Ok(value) => answers.push(AnswerRecord::new(
                    Arc::clone(&query.name),
                    record_code,
                    query.class,
                    rule.ttl,
                    value,
                )),
                Err(e) => {
                    error!(
                        rule = rule.index,
                        pattern = %rule.pattern_source,
                        record_type = record_name,
                        value = %rendered,
                        error = %e,
                        "Failed to build answer record"
                    );
                    return Vec::new();
                }
            }
        }

        answers
    }

    /// `None` means the rule's script failed and the query gets no records.
    fn response_values(
        &self,
        rule: &CompiledRule,
        query: &RouteQuery,
        record_name: &str,
    ) -> Option<Vec<String>> {
        if let Some(binding) = &rule.script {
            return match self.run_script(binding, query) {
                ScriptOutcome::Values(values) => Some(values),
                ScriptOutcome::Failed(reason) => {
                    error!(
                        rule = rule.index,
                        pattern = %rule.pattern_source,
                        script = %binding.reference,
                        reason = %reason,
                        "Error executing script"
                    );
                    None
                }
            };
        }

        match &rule.responses {
            Some(values) => Some(values.clone()),
            None => Some(vec![self.default_response(record_name)]),
        }
    }

    fn default_response(&self, record_name: &str) -> String {
        if record_name.eq_ignore_ascii_case("AAAA") {
            self.context.ipv6.to_string()
        } else {
            self.context.ipv4.to_string()
        }
    }

    fn run_script(&self, binding: &ScriptBinding, query: &RouteQuery) -> ScriptOutcome {
        let hook = match self.scripts.lookup(&binding.reference) {
            Ok(hook) => hook,
            Err(e) => return ScriptOutcome::Failed(e.to_string()),
        };

        hook.invoke(&ScriptCall {
            query_name: &query.name,
            query_class: query.class,
            query_type: query.record_type,
            args: &binding.args,
            kwargs: &binding.kwargs,
        })
    }
}
