//! Response template rendering.
//!
//! Two passes run over every response value: capture-group placeholders
//! (`${1}`, and the bare `$1` form older rule files use) first, then the
//! service placeholders `{domain}`, `{ipv4}` and `{ipv6}`.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Fixed values every rule template can refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionContext {
    pub domain: String,
    pub ipv4: Ipv4Addr,
    pub ipv6: Ipv6Addr,
}

impl SubstitutionContext {
    pub fn new(domain: impl Into<String>, ipv4: Ipv4Addr, ipv6: Ipv6Addr) -> Self {
        Self {
            domain: domain.into(),
            ipv4,
            ipv6,
        }
    }

    /// Renders `template` with `groups[i]` bound to capture group `i + 1`.
    pub fn render(&self, template: &str, groups: &[Option<&str>]) -> String {
        let with_groups = substitute_groups(template, groups);
        self.substitute_context(&with_groups)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "domain" => Some(self.domain.clone()),
            "ipv4" => Some(self.ipv4.to_string()),
            "ipv6" => Some(self.ipv6.to_string()),
            _ => None,
        }
    }

    /// `{{` and `}}` collapse to literal braces; unknown keys are kept as written.
    fn substitute_context(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('{') {
                match tail[1..].find('}') {
                    Some(end) => {
                        let key = &tail[1..end + 1];
                        match self.lookup(key) {
                            Some(value) => out.push_str(&value),
                            None => out.push_str(&tail[..end + 2]),
                        }
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push_str(tail);
                        rest = "";
                    }
                }
            } else {
                out.push('}');
                rest = &tail[1..];
            }
        }

        out.push_str(rest);
        out
    }
}

/// Replaces `${n}` and `$n` with capture group `n`. Groups that did not take
/// part in the match, and out-of-range indexes, leave the placeholder intact.
pub fn substitute_groups(template: &str, groups: &[Option<&str>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let (digits, consumed) = if let Some(braced) = tail.strip_prefix("${") {
            let len = braced.bytes().take_while(u8::is_ascii_digit).count();
            if len > 0 && braced.as_bytes().get(len) == Some(&b'}') {
                (&braced[..len], len + 3)
            } else {
                ("", 0)
            }
        } else {
            let len = tail[1..].bytes().take_while(u8::is_ascii_digit).count();
            (&tail[1..1 + len], len + 1)
        };

        let replacement = digits
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .and_then(|n| groups.get(n - 1).copied().flatten());

        match replacement {
            Some(group) if consumed > 0 => {
                out.push_str(group);
                rest = &tail[consumed..];
            }
            _ => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
