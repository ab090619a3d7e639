//! compiler.rs - Compiles obfuscation rules and applies compiled rule sets.
//!
//! Built-in rules are compiled once per process and shared through an `Arc`. Caller
//! rules are compiled when an `Obfuscator` is built, so a malformed pattern is reported
//! before any text is processed.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use once_cell::sync::OnceCell;
use regex::{Captures, Regex, RegexBuilder};
use std::borrow::Cow;
use std::sync::Arc;

use crate::config::ObfuscationRule;
use crate::errors::LogveilError;
use crate::rules::BuiltinRuleTable;

/// Upper bound on the compiled program size of a single rule.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A single compiled obfuscation rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// Replacement template expanded for every match.
    pub replace_with: String,
    /// The unique name of the rule.
    pub name: String,
}

impl CompiledRule {
    /// Replaces every non-overlapping match in `text`, leftmost first.
    ///
    /// Returns `None` when nothing matched. `count` is incremented once per replacement.
    pub fn replace_all(&self, text: &str, count: &mut usize) -> Option<String> {
        let replaced = self.regex.replace_all(text, |caps: &Captures<'_>| {
            *count += 1;
            let mut expanded = String::new();
            caps.expand(&self.replace_with, &mut expanded);
            expanded
        });
        match replaced {
            Cow::Borrowed(_) => None,
            Cow::Owned(s) => Some(s),
        }
    }
}

/// An ordered collection of compiled rules.
///
/// Order is significant: each rule sees the output of the rules before it.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    /// Compiled rules in evaluation order.
    pub rules: Vec<CompiledRule>,
}

impl CompiledRules {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Applies every rule in order to `text`.
    ///
    /// `counts` must hold one slot per rule; each slot is incremented by the number of
    /// replacements its rule made.
    pub fn apply(&self, text: &str, counts: &mut [usize]) -> String {
        debug_assert_eq!(counts.len(), self.rules.len());
        let mut current = text.to_string();
        for (rule, count) in self.rules.iter().zip(counts.iter_mut()) {
            if let Some(replaced) = rule.replace_all(&current, count) {
                current = replaced;
            }
        }
        current
    }

    /// Concatenates two rule sets, keeping `self` first.
    pub fn chained(&self, other: &CompiledRules) -> CompiledRules {
        CompiledRules {
            rules: self.rules.iter().chain(other.rules.iter()).cloned().collect(),
        }
    }
}

/// Returns the group references used by a replacement template.
///
/// Follows the `regex` crate expansion syntax: `$$` is a literal dollar, `${name}` is a
/// braced reference and `$name` takes the longest run of `[_0-9A-Za-z]`.
fn template_references(template: &str) -> Vec<&str> {
    let mut references = Vec::new();
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        if let Some(after) = rest.strip_prefix('$') {
            rest = after;
            continue;
        }
        if let Some(braced) = rest.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                if end > 0 {
                    references.push(&braced[..end]);
                }
                rest = &braced[end + 1..];
            }
            continue;
        }
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end > 0 {
            references.push(&rest[..end]);
        }
        rest = &rest[end..];
    }
    references
}

/// Ensures every group the template refers to exists in the compiled pattern.
fn check_template_groups(rule_name: &str, regex: &Regex, template: &str) -> Result<(), LogveilError> {
    for reference in template_references(template) {
        let exists = match reference.parse::<usize>() {
            Ok(index) => index < regex.captures_len(),
            Err(_) => regex.capture_names().flatten().any(|name| name == reference),
        };
        if !exists {
            return Err(LogveilError::UnknownCaptureGroup(
                rule_name.to_string(),
                reference.to_string(),
            ));
        }
    }
    Ok(())
}

fn compile_rule(rule: ObfuscationRule) -> Result<CompiledRule, LogveilError> {
    if rule.pattern.is_empty() {
        return Err(LogveilError::EmptyPattern(rule.name));
    }

    let regex = RegexBuilder::new(&rule.pattern)
        .case_insensitive(rule.case_insensitive)
        .multi_line(rule.multiline)
        .dot_matches_new_line(rule.dot_matches_new_line)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| LogveilError::RuleCompilationError(rule.name.clone(), e))?;

    check_template_groups(&rule.name, &regex, &rule.replace_with)?;

    debug!(
        target: "logveil_core::compiler",
        "Rule '{}' compiled successfully.",
        &rule.name
    );
    Ok(CompiledRule {
        regex,
        replace_with: rule.replace_with,
        name: rule.name,
    })
}

/// Compiles a list of `ObfuscationRule`s, preserving their order.
///
/// Disabled rules are skipped. Every failing rule is reported, not just the first one.
pub fn compile_rules(rules_to_compile: Vec<ObfuscationRule>) -> Result<CompiledRules, LogveilError> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled_rules = Vec::with_capacity(rules_to_compile.len());
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        if !rule.enabled {
            warn!("Skipping rule '{}' because it is disabled.", &rule.name);
            continue;
        }
        match compile_rule(rule) {
            Ok(compiled) => compiled_rules.push(compiled),
            Err(e) => compilation_errors.push(e),
        }
    }

    match compilation_errors.len() {
        0 => {
            debug!("Finished compiling rules. Total compiled: {}.", compiled_rules.len());
            Ok(CompiledRules { rules: compiled_rules })
        }
        1 => Err(compilation_errors.remove(0)),
        n => {
            let error_message = compilation_errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<String>>()
                .join("\n");
            Err(LogveilError::Fatal(format!(
                "Failed to compile {} rule(s):\n{}",
                n, error_message
            )))
        }
    }
}

/// The compiled built-in rule sets, shared by every obfuscator.
#[derive(Debug)]
pub struct BuiltinRules {
    pub primary: Arc<CompiledRules>,
    pub cleanup: Arc<CompiledRules>,
}

static BUILTIN_RULES: OnceCell<BuiltinRules> = OnceCell::new();

/// Returns the compiled built-in rules, compiling them on first use.
pub fn builtin_rules() -> Result<&'static BuiltinRules, LogveilError> {
    BUILTIN_RULES.get_or_try_init(|| {
        debug!("Compiling built-in rule table.");
        let table = BuiltinRuleTable::load()?;
        Ok(BuiltinRules {
            primary: Arc::new(compile_rules(table.primary_rules)?),
            cleanup: Arc::new(compile_rules(table.cleanup_rules)?),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_references() {
        assert_eq!(template_references("${1}××${3}"), vec!["1", "3"]);
        assert_eq!(template_references("$1-$name"), vec!["1", "name"]);
        assert_eq!(template_references("$$1 costs ${}"), Vec::<&str>::new());
        assert_eq!(template_references("plain"), Vec::<&str>::new());
    }

    #[test]
    fn test_unknown_numbered_group_is_rejected() {
        let rules = vec![ObfuscationRule::new("bad_ref", "(a)(b)", "$1$3")];
        assert!(matches!(
            compile_rules(rules),
            Err(LogveilError::UnknownCaptureGroup(name, group)) if name == "bad_ref" && group == "3"
        ));
    }

    #[test]
    fn test_unbraced_reference_followed_by_letters_is_rejected() {
        let rules = vec![ObfuscationRule::new("ambiguous", "(a)", "$1abc")];
        assert!(matches!(
            compile_rules(rules),
            Err(LogveilError::UnknownCaptureGroup(_, group)) if group == "1abc"
        ));
    }

    #[test]
    fn test_named_group_reference() {
        let rules = vec![ObfuscationRule::new("named", "(?P<key>k)=(?P<value>v)", "${key}=*")];
        let compiled = compile_rules(rules).unwrap();
        let mut counts = vec![0; compiled.len()];
        assert_eq!(compiled.apply("k=v, K=V", &mut counts), "k=*, K=*");
        assert_eq!(counts, vec![2]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let rules = vec![ObfuscationRule::new("broken", "(unclosed", "x")];
        assert!(matches!(
            compile_rules(rules),
            Err(LogveilError::RuleCompilationError(name, _)) if name == "broken"
        ));
    }

    #[test]
    fn test_oversized_program_is_a_compilation_error() {
        let rules = vec![ObfuscationRule::new("huge", r"(?:\w{100}){100}", "x")];
        assert!(matches!(
            compile_rules(rules),
            Err(LogveilError::RuleCompilationError(name, _)) if name == "huge"
        ));
    }

    #[test]
    fn test_multiple_failures_are_aggregated() {
        let rules = vec![
            ObfuscationRule::new("first", "(", "x"),
            ObfuscationRule::new("second", "[", "x"),
        ];
        match compile_rules(rules) {
            Err(LogveilError::Fatal(message)) => {
                assert!(message.contains("2 rule(s)"));
                assert!(message.contains("'first'"));
                assert!(message.contains("'second'"));
            }
            other => panic!("expected aggregated failure, got {:?}", other),
        }
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let mut disabled = ObfuscationRule::new("off", "(", "x");
        disabled.enabled = false;
        let compiled = compile_rules(vec![disabled, ObfuscationRule::new("on", "a", "b")]).unwrap();
        assert_eq!(compiled.names(), vec!["on"]);
    }

    #[test]
    fn test_rules_apply_in_order() {
        let compiled = compile_rules(vec![
            ObfuscationRule::new("a_to_b", "a", "b"),
            ObfuscationRule::new("b_to_c", "b", "c"),
        ])
        .unwrap();
        let mut counts = vec![0; 2];
        assert_eq!(compiled.apply("aab", &mut counts), "ccc");
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_builtin_rules_compile_once() {
        let first = builtin_rules().unwrap();
        let second = builtin_rules().unwrap();
        assert!(Arc::ptr_eq(&first.primary, &second.primary));
        assert_eq!(first.primary.len(), 5);
        assert_eq!(first.cleanup.len(), 2);
    }
}
