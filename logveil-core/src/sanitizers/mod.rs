//! Rule compilation and application for logveil.
//!
//! This module turns `ObfuscationRule` definitions into compiled regular expressions and
//! applies ordered rule sets to text. It works closely with `config` (for rule
//! definitions), `rules` (for the built-in table) and `summary` (for match reporting).

pub mod compiler;
