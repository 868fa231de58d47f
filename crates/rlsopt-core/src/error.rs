//! Error types for online stochastic optimization.
//!
//! This module defines the core error types used throughout the library,
//! split between failures raised by the external objective oracle and
//! failures detected by the optimizer itself.

use thiserror::Error;

/// Errors raised by the external objective/gradient oracle.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The oracle could not evaluate the objective at the requested point.
    ///
    /// Use this variant for application-level failures such as a missing
    /// minibatch or a backend error inside the oracle.
    #[error("Objective evaluation failed: {reason}")]
    EvaluationFailed {
        /// Description of why the evaluation failed
        reason: String,
    },

    /// The oracle produced a non-finite objective value.
    #[error("Objective returned a non-finite value")]
    NonFiniteValue,

    /// The oracle produced a non-finite gradient entry.
    #[error("Objective returned a non-finite gradient entry at index {index}")]
    NonFiniteGradient {
        /// Index of the first offending gradient entry
        index: usize,
    },
}

impl OracleError {
    /// Create an EvaluationFailed error with a custom reason.
    pub fn evaluation_failed<S: Into<String>>(reason: S) -> Self {
        Self::EvaluationFailed {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during an optimization step.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Dimension mismatch between the optimizer state and a supplied point.
    ///
    /// This error occurs when a state initialized for one parameter
    /// dimension is reused with a point of a different length, or when the
    /// oracle returns a gradient of the wrong length.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g., non-positive learning rate, decay exponent
    /// outside [0, 1)).
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Propagated oracle error.
    ///
    /// This error wraps failures of the external objective oracle. The
    /// optimizer state is left unmodified when it is returned.
    #[error("Objective oracle error: {0}")]
    ObjectiveEvaluation(#[from] OracleError),
}

impl OptimizerError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create an error describing an internally inconsistent state.
    pub fn invalid_state<S: Into<String>>(reason: S) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: "state".to_string(),
            value: "invalid".to_string(),
        }
    }
}

/// Result type alias for oracle evaluations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;
