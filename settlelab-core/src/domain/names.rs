//! Parsing of the snake_case names used by the config file and the CLI.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Case-insensitive, `-` accepted for `_`.
pub(crate) fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

pub(crate) fn unknown(kind: &'static str, value: &str, expected: &'static str) -> ParseNameError {
    ParseNameError {
        kind,
        value: value.to_string(),
        expected,
    }
}
