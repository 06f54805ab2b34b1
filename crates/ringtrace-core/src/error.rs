//! Error types for the ringtrace engine.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can surface from the detection core.
///
/// The core either produces a report or fails with one of these kinds.
/// Malformed input has no counterpart here; upstream validation absorbs it
/// before transactions reach the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An internal consistency check failed (e.g. a ring references an
    /// unknown account). Fatal; indicates a bug in the engine.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The input batch contained no transactions. The pipeline itself
    /// prefers producing an empty report; this kind exists for callers
    /// that need to treat an empty batch as failure.
    #[error("empty input: no transactions to analyze")]
    EmptyInput,
}

impl EngineError {
    /// Create an invariant violation error.
    #[must_use]
    pub fn invariant(msg: impl Into<String>) -> Self {
        EngineError::InvariantViolation(msg.into())
    }

    /// Returns true if this error indicates an engine bug rather than a
    /// property of the input.
    #[must_use]
    pub fn is_bug(&self) -> bool {
        matches!(self, EngineError::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_constructor() {
        let err = EngineError::invariant("ring RING_007 references unknown account X");
        assert!(err.is_bug());
        assert!(err.to_string().contains("RING_007"));
    }

    #[test]
    fn test_empty_input_is_not_a_bug() {
        assert!(!EngineError::EmptyInput.is_bug());
        assert_eq!(
            EngineError::EmptyInput.to_string(),
            "empty input: no transactions to analyze"
        );
    }
}
