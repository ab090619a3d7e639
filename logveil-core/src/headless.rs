// File: logveil-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot obfuscation.
//!
//! Callers that obfuscate many strings should build an `Obfuscator` once and reuse it.
//! These helpers exist for call sites that only have a configuration, or that are happy
//! with the defaults.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

use crate::config::ObfuscatorConfig;
use crate::errors::LogveilError;
use crate::obfuscator::Obfuscator;

static DEFAULT_OBFUSCATOR: OnceCell<Obfuscator> = OnceCell::new();

/// Builds an obfuscator from `config` and applies it to `content` once.
pub fn headless_obfuscate_string(config: ObfuscatorConfig, content: &str) -> Result<String> {
    let obfuscator =
        Obfuscator::with_config(config).context("Failed to build obfuscator for headless use")?;
    Ok(obfuscator.obfuscate(content))
}

/// Obfuscates `content` with the default settings and built-in rules only.
///
/// The underlying obfuscator is built on first use and shared afterwards.
pub fn obfuscate_default(content: &str) -> Result<String, LogveilError> {
    let obfuscator = DEFAULT_OBFUSCATOR.get_or_try_init(Obfuscator::try_default)?;
    Ok(obfuscator.obfuscate(content))
}
