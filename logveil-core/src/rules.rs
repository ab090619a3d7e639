//! Built-in obfuscation rules.
//!
//! The rule table lives in `config/builtin_rules.yaml` and is embedded at build time.
//! Keeping it as data makes the evaluation order explicit: the order of entries in the
//! file is the order in which they are applied.

use log::debug;
use serde::Deserialize;

use crate::config::ObfuscationRule;
use crate::errors::LogveilError;

/// The fixed 8-character sequence substituted for masked secret values.
pub const MASK: &str = "××××××××";

/// Placeholder for a detected base64 value.
pub const BASE64_PLACEHOLDER: &str = "< BASE64 ENCODED VALUE >";

/// Placeholder for a base64 value cut off by the end of a chunk.
pub const TRUNCATED_BASE64_PLACEHOLDER: &str = "< TRUNCATED BASE64 ENCODED VALUE >";

const BUILTIN_RULES_YAML: &str = include_str!("../config/builtin_rules.yaml");

/// The two ordered rule sets shipped with the crate.
#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinRuleTable {
    /// Applied to every chunk, before any caller rule.
    pub primary_rules: Vec<ObfuscationRule>,
    /// Applied once to the reassembled output.
    pub cleanup_rules: Vec<ObfuscationRule>,
}

impl BuiltinRuleTable {
    /// Parses the embedded rule table.
    pub fn load() -> Result<Self, LogveilError> {
        let table: BuiltinRuleTable = serde_yml::from_str(BUILTIN_RULES_YAML)
            .map_err(|e| LogveilError::ConfigParseError(format!("built-in rules: {e}")))?;
        debug!(
            "Loaded {} built-in primary rules and {} cleanup rules.",
            table.primary_rules.len(),
            table.cleanup_rules.len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_order() {
        let table = BuiltinRuleTable::load().unwrap();
        let primary: Vec<&str> = table.primary_rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            primary,
            vec!["token_short", "token_long", "password", "base64_truncated", "base64_full"]
        );
        let cleanup: Vec<&str> = table.cleanup_rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(cleanup, vec!["base64_glue", "base64_tails"]);
    }

    #[test]
    fn test_builtin_rules_use_matching_defaults() {
        let table = BuiltinRuleTable::load().unwrap();
        for rule in table.primary_rules.iter().chain(&table.cleanup_rules) {
            assert!(rule.enabled, "rule '{}' should be enabled", rule.name);
            assert!(rule.case_insensitive, "rule '{}' should ignore case", rule.name);
            assert!(!rule.multiline, "rule '{}' must anchor to the chunk end", rule.name);
        }
    }

    #[test]
    fn test_mask_is_eight_chars() {
        assert_eq!(MASK.chars().count(), 8);
    }
}
