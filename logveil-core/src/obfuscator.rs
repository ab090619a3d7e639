//! The chunked, two-phase obfuscator.
//!
//! Phase 1 splits the input into chunks of at most `max_chunk_length` characters and
//! applies the primary rules to each chunk on its own, which bounds the matching cost on
//! very large inputs. A value that straddles a chunk boundary is only partly matched in
//! this phase. Phase 2 runs the cleanup rules once over the concatenated result and
//! merges the base64 fragments left behind at the boundaries.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, trace};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::chunker::split_chunks;
use crate::config::{ObfuscationRule, ObfuscatorConfig};
use crate::engine::SanitizationEngine;
use crate::errors::LogveilError;
use crate::sanitizers::compiler::{builtin_rules, compile_rules, CompiledRules};
use crate::summary::{log_summary_debug, loggable, summarize, RedactionSummaryItem, RulePhase};

/// Masks tokens, passwords and base64 values in arbitrary text.
///
/// Built once and reused; cloning is cheap because the compiled rules are shared.
#[derive(Debug, Clone)]
pub struct Obfuscator {
    max_chunk_length: NonZeroUsize,
    primary_rules: Arc<CompiledRules>,
    cleanup_rules: Arc<CompiledRules>,
}

impl Obfuscator {
    /// Builds an obfuscator from a chunk length and caller rules.
    ///
    /// The caller rules run after the built-in primary rules, in the given order.
    pub fn new(
        max_chunk_length: usize,
        additional_rules: Vec<ObfuscationRule>,
    ) -> Result<Self, LogveilError> {
        Self::with_config(ObfuscatorConfig::new(max_chunk_length, additional_rules))
    }

    /// Builds an obfuscator with the default chunk length and only the built-in rules.
    pub fn try_default() -> Result<Self, LogveilError> {
        Self::with_config(ObfuscatorConfig::default())
    }

    /// Builds an obfuscator from a full configuration.
    ///
    /// Fails if the chunk length is zero or if any additional rule is invalid.
    /// Unnamed additional rules are named `additional_<position>`.
    pub fn with_config(mut config: ObfuscatorConfig) -> Result<Self, LogveilError> {
        config.name_unnamed_rules();
        config.validate()?;
        let max_chunk_length = NonZeroUsize::new(config.max_chunk_length)
            .ok_or(LogveilError::InvalidMaxChunkLength(config.max_chunk_length))?;

        let builtin = builtin_rules()?;
        let primary_rules = if config.additional_rules.is_empty() {
            Arc::clone(&builtin.primary)
        } else {
            let additional = compile_rules(config.additional_rules)?;
            Arc::new(builtin.primary.chained(&additional))
        };

        debug!(
            "Obfuscator ready: {} primary rules, {} cleanup rules, chunks of {} chars.",
            primary_rules.len(),
            builtin.cleanup.len(),
            max_chunk_length
        );

        Ok(Self {
            max_chunk_length,
            primary_rules,
            cleanup_rules: Arc::clone(&builtin.cleanup),
        })
    }

    /// Obfuscates `text`. Never fails; the empty string maps to itself.
    pub fn obfuscate(&self, text: &str) -> String {
        let mut primary_counts = vec![0; self.primary_rules.len()];
        let mut cleanup_counts = vec![0; self.cleanup_rules.len()];
        self.run(text, &mut primary_counts, &mut cleanup_counts)
    }

    /// Obfuscates `text` and reports, in evaluation order, every rule that fired.
    pub fn obfuscate_with_summary(&self, text: &str) -> (String, Vec<RedactionSummaryItem>) {
        let mut primary_counts = vec![0; self.primary_rules.len()];
        let mut cleanup_counts = vec![0; self.cleanup_rules.len()];
        let output = self.run(text, &mut primary_counts, &mut cleanup_counts);

        let mut summary = summarize(self.primary_rules.names(), &primary_counts, RulePhase::Primary);
        summary.extend(summarize(
            self.cleanup_rules.names(),
            &cleanup_counts,
            RulePhase::Cleanup,
        ));
        log_summary_debug(&summary);
        (output, summary)
    }

    /// Phase 1 only: primary rules applied chunk by chunk, results concatenated.
    ///
    /// The output may still contain truncated placeholders and base64 fragments at
    /// chunk boundaries.
    pub fn obfuscate_chunks(&self, text: &str) -> String {
        let mut counts = vec![0; self.primary_rules.len()];
        self.apply_primary(text, &mut counts)
    }

    /// Phase 2 only: cleanup rules applied once to already chunk-obfuscated text.
    pub fn finalize(&self, text: &str) -> String {
        let mut counts = vec![0; self.cleanup_rules.len()];
        self.cleanup_rules.apply(text, &mut counts)
    }

    pub fn max_chunk_length(&self) -> usize {
        self.max_chunk_length.get()
    }

    pub fn primary_rules(&self) -> &CompiledRules {
        &self.primary_rules
    }

    pub fn cleanup_rules(&self) -> &CompiledRules {
        &self.cleanup_rules
    }

    fn run(&self, text: &str, primary_counts: &mut [usize], cleanup_counts: &mut [usize]) -> String {
        debug!("Obfuscating input {}.", loggable(text));
        let chunked = self.apply_primary(text, primary_counts);
        self.cleanup_rules.apply(&chunked, cleanup_counts)
    }

    fn apply_primary(&self, text: &str, counts: &mut [usize]) -> String {
        let mut output = String::with_capacity(text.len());
        for (index, chunk) in split_chunks(text, self.max_chunk_length).enumerate() {
            trace!("Applying primary rules to chunk {} ({} bytes).", index, chunk.len());
            output.push_str(&self.primary_rules.apply(chunk, counts));
        }
        output
    }
}

impl SanitizationEngine for Obfuscator {
    fn sanitize(&self, content: &str) -> String {
        self.obfuscate(content)
    }

    fn sanitize_with_summary(&self, content: &str) -> (String, Vec<RedactionSummaryItem>) {
        self.obfuscate_with_summary(content)
    }

    fn primary_rules(&self) -> &CompiledRules {
        &self.primary_rules
    }

    fn cleanup_rules(&self) -> &CompiledRules {
        &self.cleanup_rules
    }

    fn max_chunk_length(&self) -> usize {
        self.max_chunk_length.get()
    }
}
