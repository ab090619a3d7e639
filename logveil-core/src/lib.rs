// logveil-core/src/lib.rs
//! # logveil Core Library
//!
//! `logveil-core` masks sensitive values in arbitrary text, typically log lines, before
//! they are written anywhere. It matches raw text against an ordered table of regex
//! rules; it does not parse JSON or any other format.
//!
//! ## How it works
//!
//! 1. The input is split into chunks of at most `max_chunk_length` characters
//!    (default 6000), which bounds the matching cost on very large inputs.
//! 2. The primary rules run against each chunk, in order:
//!    short token mask, long token mask, password mask, truncated base64 detector,
//!    full base64 detector, then any caller rules.
//! 3. The chunk results are concatenated and two cleanup rules merge the base64
//!    placeholders and fragments left behind where a value straddled a chunk boundary.
//!
//! ## Modules
//!
//! * `config`: `ObfuscationRule` and `ObfuscatorConfig`, YAML loading and validation.
//! * `rules`: the embedded built-in rule table and the mask/placeholder constants.
//! * `sanitizers`: compilation of rules and application of compiled rule sets.
//! * `chunker`: character-counted chunking.
//! * `engine`: the `SanitizationEngine` trait.
//! * `obfuscator`: the two-phase `Obfuscator`.
//! * `summary`: per-rule match counts and log-safe rendering of sensitive text.
//! * `headless`: one-shot convenience wrappers.
//! * `errors`: the `LogveilError` type.
//!
//! ## Usage Example
//!
//! ```rust
//! use logveil_core::{Obfuscator, ObfuscationRule};
//!
//! fn main() -> Result<(), logveil_core::LogveilError> {
//!     let obfuscator = Obfuscator::new(
//!         6000,
//!         vec![ObfuscationRule::new("ssn", r"\d{3}-\d{2}-\d{4}", "[SSN]")],
//!     )?;
//!
//!     let line = r#"{"token": "123456789", "password": "secret", "ssn": "123-45-6789"}"#;
//!     assert_eq!(
//!         obfuscator.obfuscate(line),
//!         r#"{"token": "12××××××××6789", "password": "××××××××", "ssn": "[SSN]"}"#
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Construction returns `LogveilError` for a zero chunk length or an invalid rule.
//! Obfuscation itself never fails. File loading uses `anyhow::Error` with context.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod chunker;
pub mod config;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod obfuscator;
pub mod rules;
pub mod sanitizers;
pub mod summary;

/// Re-exports the configuration types for obfuscation rules.
pub use config::{
    validate_rules,
    ObfuscationRule,
    ObfuscatorConfig,
    DEFAULT_MAX_CHUNK_LENGTH,
};

/// Re-exports the custom error type.
pub use errors::LogveilError;

pub use engine::SanitizationEngine;
pub use obfuscator::Obfuscator;

/// Re-exports the built-in rule table and its output markers.
pub use rules::{BuiltinRuleTable, BASE64_PLACEHOLDER, MASK, TRUNCATED_BASE64_PLACEHOLDER};

pub use summary::{RedactionSummaryItem, RulePhase};

pub use headless::{headless_obfuscate_string, obfuscate_default};

// Re-export compiled rule types for advanced usage.
pub use sanitizers::compiler::{compile_rules, CompiledRule, CompiledRules};
