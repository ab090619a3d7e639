// logveil-core/src/engine.rs
//! Defines the `SanitizationEngine` trait.
//!
//! The trait decouples logging pipelines from the concrete obfuscator so that an engine
//! can be stored as `Box<dyn SanitizationEngine>` or swapped out in tests.
//!
//! License: MIT OR APACHE 2.0

use crate::sanitizers::compiler::CompiledRules;
use crate::summary::RedactionSummaryItem;

/// Core functionality of a text sanitization engine.
///
/// Implementations are immutable after construction: every method takes `&self`, and
/// sanitizing the same input twice yields the same output.
pub trait SanitizationEngine: Send + Sync {
    /// Returns `content` with every detected secret masked. Never fails.
    fn sanitize(&self, content: &str) -> String;

    /// Like `sanitize`, also reporting how many replacements each rule made.
    fn sanitize_with_summary(&self, content: &str) -> (String, Vec<RedactionSummaryItem>);

    /// Rules applied to every chunk, in evaluation order.
    fn primary_rules(&self) -> &CompiledRules;

    /// Rules applied once to the reassembled output, in evaluation order.
    fn cleanup_rules(&self) -> &CompiledRules;

    /// Maximum chunk length in characters.
    fn max_chunk_length(&self) -> usize;
}
