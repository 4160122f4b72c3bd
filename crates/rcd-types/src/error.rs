// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

use crate::injection::InjectionTarget;

/// Root error type for all RCD kernel failures.
///
/// Numeric degeneracies (zero variance, zero norm, failed Procrustes
/// alignment) are not errors: the metric functions substitute their
/// documented fallback values instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RcdError {
    /// Invalid parameter or configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Injection payload does not match the shape of its target.
    #[error("shape mismatch for {target}: expected {expected}, got {got}")]
    ShapeMismatch {
        target: InjectionTarget,
        expected: String,
        got: String,
    },

    /// Operation not allowed in the engine's current lifecycle state.
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    /// Numerical error (NaN/Inf at an API boundary).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type RcdResult<T> = Result<T, RcdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = RcdError::ShapeMismatch {
            target: InjectionTarget::H,
            expected: "3 elements".into(),
            got: "2 elements".into(),
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch for H: expected 3 elements, got 2 elements"
        );
    }

    #[test]
    fn test_config_message() {
        let err = RcdError::Config("n_dimensions must be >= 1".into());
        assert!(err.to_string().starts_with("config error"));
    }
}
