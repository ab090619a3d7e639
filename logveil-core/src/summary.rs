//! Match reporting and log-safe rendering of sensitive text.
//!
//! Summaries carry rule names and counts only. Debug logging of matched text goes
//! through `loggable`, which hides the content unless `LOGVEIL_ALLOW_DEBUG_PII=true`.

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Read once: whether raw text may appear in debug logs.
static PII_DEBUG_ALLOWED: Lazy<bool> = Lazy::new(|| {
    std::env::var("LOGVEIL_ALLOW_DEBUG_PII")
        .map(|s| s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// The pipeline phase a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePhase {
    /// Applied to each chunk.
    Primary,
    /// Applied once to the reassembled output.
    Cleanup,
}

/// Number of replacements a single rule made during one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionSummaryItem {
    pub rule_name: String,
    pub phase: RulePhase,
    pub occurrences: usize,
}

/// Builds summary items for the rules that replaced at least one match.
pub(crate) fn summarize<'a>(
    names: impl IntoIterator<Item = &'a str>,
    counts: &[usize],
    phase: RulePhase,
) -> Vec<RedactionSummaryItem> {
    names
        .into_iter()
        .zip(counts)
        .filter(|&(_, &occurrences)| occurrences > 0)
        .map(|(rule_name, &occurrences)| RedactionSummaryItem {
            rule_name: rule_name.to_string(),
            phase,
            occurrences,
        })
        .collect()
}

/// Describes a sensitive string without revealing it.
pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let len = s.chars().count();
    if len <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", len)
    }
}

/// Returns `text` as it may be written to a debug log.
pub fn loggable(text: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        text.to_string()
    } else {
        redact_sensitive(text)
    }
}

pub(crate) fn log_summary_debug(items: &[RedactionSummaryItem]) {
    for item in items {
        debug!(
            "Rule '{}' ({:?}) replaced {} match(es).",
            item.rule_name, item.phase, item.occurrences
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_long_string() {
        assert_eq!(redact_sensitive("123456789"), "[REDACTED: 9 chars]".to_string());
    }

    #[test]
    fn test_redact_sensitive_counts_characters() {
        assert_eq!(redact_sensitive("××××××××"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_summarize_skips_rules_without_matches() {
        let items = summarize(["a", "b", "c"], &[1, 0, 4], RulePhase::Primary);
        assert_eq!(
            items,
            vec![
                RedactionSummaryItem { rule_name: "a".into(), phase: RulePhase::Primary, occurrences: 1 },
                RedactionSummaryItem { rule_name: "c".into(), phase: RulePhase::Primary, occurrences: 4 },
            ]
        );
    }
}
