//! Error types for the matching primitives.

use thiserror::Error;

/// Failure while evaluating a URL rule or element selector.
///
/// These never cross the engine boundary: callers log them and treat the
/// affected rule as a non-match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MatchError {
    /// `matchesRegex` value failed to compile.
    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// Selector text could not be parsed.
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Selector is well-formed but uses syntax the matcher does not evaluate.
    #[error("unsupported selector '{selector}': {reason}")]
    UnsupportedSelector { selector: String, reason: String },
}

impl MatchError {
    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
