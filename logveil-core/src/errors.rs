//! errors.rs - Custom error types for the logveil-core library.
//!
//! Every error here is raised while an `Obfuscator` is being built. Once constructed,
//! obfuscation itself cannot fail.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error types produced by `logveil-core`.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LogveilError {
    #[error("Invalid maximum chunk length {0}: it must be greater than zero")]
    InvalidMaxChunkLength(usize),

    #[error("Failed to compile obfuscation rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}' has an empty pattern")]
    EmptyPattern(String),

    #[error("Duplicate rule name found: '{0}'")]
    DuplicateRuleName(String),

    #[error("Rule '{0}': replacement references non-existent capture group '{1}'")]
    UnknownCaptureGroup(String, String),

    #[error("Failed to parse obfuscator configuration: {0}")]
    ConfigParseError(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}
