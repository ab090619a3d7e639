//! Configuration management for `logveil-core`.
//!
//! This module defines the data structures for obfuscation rules and obfuscator settings.
//! It handles YAML deserialization of rule files and validates rule definitions before
//! any of them reach the compiler.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::LogveilError;

/// Default maximum number of characters processed by the primary rules in one pass.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 6000;

/// A single obfuscation rule: a detector pattern and the template its matches are
/// rewritten with.
///
/// The template uses the `regex` crate expansion syntax, so `$1` or `${1}` refer to
/// numbered groups and `${name}` to named groups. Prefer the braced form when a group
/// reference is directly followed by letters, digits or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObfuscationRule {
    /// Unique identifier for the rule (e.g., "api_key").
    pub name: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// The regex pattern string.
    pub pattern: String,
    /// The replacement template applied to every match.
    pub replace_with: String,
    /// Matches regardless of letter case. On by default.
    pub case_insensitive: bool,
    /// If true, `^` and `$` match at line boundaries instead of only at the ends of a chunk.
    pub multiline: bool,
    /// If true, `.` also matches `\n`. On by default so values may span lines.
    pub dot_matches_new_line: bool,
    /// Disabled rules are kept in the configuration but never compiled.
    pub enabled: bool,
}

impl Default for ObfuscationRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            pattern: String::new(),
            replace_with: String::new(),
            case_insensitive: true,
            multiline: false,
            dot_matches_new_line: true,
            enabled: true,
        }
    }
}

impl ObfuscationRule {
    /// Creates an enabled rule with the default matching flags.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        replace_with: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replace_with: replace_with.into(),
            ..Self::default()
        }
    }
}

/// Settings for an `Obfuscator`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObfuscatorConfig {
    /// Maximum chunk length in characters. Must be greater than zero.
    pub max_chunk_length: usize,
    /// Caller rules, evaluated after the built-in primary rules in the given order.
    pub additional_rules: Vec<ObfuscationRule>,
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            additional_rules: Vec::new(),
        }
    }
}

impl ObfuscatorConfig {
    pub fn new(max_chunk_length: usize, additional_rules: Vec<ObfuscationRule>) -> Self {
        Self {
            max_chunk_length,
            additional_rules,
        }
    }

    /// Parses and validates a YAML configuration document.
    pub fn from_yaml_str(text: &str) -> Result<Self, LogveilError> {
        let config: ObfuscatorConfig = serde_yml::from_str(text)
            .map_err(|e| LogveilError::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads obfuscator settings and additional rules from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading obfuscator configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;

        info!(
            "Loaded {} additional rules from file {}.",
            config.additional_rules.len(),
            path.display()
        );
        Ok(config)
    }

    /// Gives every unnamed additional rule the name `additional_<position>`.
    pub fn name_unnamed_rules(&mut self) {
        for (index, rule) in self.additional_rules.iter_mut().enumerate() {
            if rule.name.is_empty() {
                rule.name = default_rule_name(index);
            }
        }
    }

    /// Checks the chunk length and the structural integrity of the additional rules.
    ///
    /// Pattern syntax and capture group references are checked when the rules are
    /// compiled, which also happens at construction time.
    pub fn validate(&self) -> Result<(), LogveilError> {
        if self.max_chunk_length == 0 {
            return Err(LogveilError::InvalidMaxChunkLength(self.max_chunk_length));
        }
        validate_rules(&self.additional_rules)
    }
}

/// Validates rule names and patterns.
///
/// Unnamed rules are allowed; they are named after their position when an `Obfuscator`
/// is built.
pub fn validate_rules(rules: &[ObfuscationRule]) -> Result<(), LogveilError> {
    let mut rule_names = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if !rule.name.is_empty() && !rule_names.insert(rule.name.as_str()) {
            return Err(LogveilError::DuplicateRuleName(rule.name.clone()));
        }
        if rule.pattern.is_empty() {
            return Err(LogveilError::EmptyPattern(display_name(rule, index)));
        }
    }

    debug!("Validated {} rule definitions.", rules.len());
    Ok(())
}

fn default_rule_name(index: usize) -> String {
    format!("additional_{index}")
}

fn display_name(rule: &ObfuscationRule, index: usize) -> String {
    if rule.name.is_empty() {
        default_rule_name(index)
    } else {
        rule.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObfuscatorConfig::default();
        assert_eq!(config.max_chunk_length, 6000);
        assert!(config.additional_rules.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_length_is_rejected() {
        let config = ObfuscatorConfig::new(0, Vec::new());
        assert!(matches!(
            config.validate(),
            Err(LogveilError::InvalidMaxChunkLength(0))
        ));
    }

    #[test]
    fn test_rule_defaults_from_yaml() {
        let yaml = r#"
additional_rules:
  - name: secret
    pattern: '("secret":\s*")([^"]+)(")'
    replace_with: '${1}***${3}'
"#;
        let config = ObfuscatorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_chunk_length, DEFAULT_MAX_CHUNK_LENGTH);
        let rule = &config.additional_rules[0];
        assert!(rule.case_insensitive);
        assert!(rule.dot_matches_new_line);
        assert!(!rule.multiline);
        assert!(rule.enabled);
        assert_eq!(rule.description, None);
    }

    #[test]
    fn test_duplicate_rule_names_are_rejected() {
        let rules = vec![
            ObfuscationRule::new("dup", "a", "b"),
            ObfuscationRule::new("dup", "c", "d"),
        ];
        assert!(matches!(
            validate_rules(&rules),
            Err(LogveilError::DuplicateRuleName(name)) if name == "dup"
        ));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let rules = vec![ObfuscationRule::new("empty", "", "x")];
        assert!(matches!(
            validate_rules(&rules),
            Err(LogveilError::EmptyPattern(_))
        ));
    }

    #[test]
    fn test_long_pattern_is_accepted() {
        let rules = vec![ObfuscationRule::new("long", "a".repeat(2000), "x")];
        assert!(validate_rules(&rules).is_ok());
    }

    #[test]
    fn test_unnamed_rules_get_positional_names() {
        let mut config = ObfuscatorConfig::new(
            100,
            vec![
                ObfuscationRule::new("", "a", "b"),
                ObfuscationRule::new("named", "c", "d"),
                ObfuscationRule::new("", "e", "f"),
            ],
        );
        assert!(config.validate().is_ok());
        config.name_unnamed_rules();
        let names: Vec<&str> = config.additional_rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["additional_0", "named", "additional_2"]);
    }

    #[test]
    fn test_unnamed_rule_with_empty_pattern_reports_position() {
        let rules = vec![ObfuscationRule::new("ok", "a", "b"), ObfuscationRule::new("", "", "x")];
        assert!(matches!(
            validate_rules(&rules),
            Err(LogveilError::EmptyPattern(name)) if name == "additional_1"
        ));
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let result = ObfuscatorConfig::from_yaml_str("max_chunk_length: [not, a, number]");
        assert!(matches!(result, Err(LogveilError::ConfigParseError(_))));
    }
}
