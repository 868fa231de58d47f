//! Core traits and types for RLS-preconditioned stochastic optimization.
//!
//! This crate provides the foundational pieces for an online stochastic
//! optimizer whose preconditioner is estimated by recursive least squares
//! between parameter iterates and observed gradients: the scalar and
//! dense-storage typing, the error taxonomy, the objective oracle
//! interface, step size schedules, and the persistent optimizer state.
//!
//! # Key Concepts
//!
//! - **Oracle**: an external capability returning an objective value and
//!   gradient at a point, possibly stochastic.
//! - **Augmented regressor**: a parameter vector with a constant 1
//!   appended, giving the online regression an intercept term.
//! - **Rank-one (Sherman-Morrison) update**: closed-form incremental
//!   update of a matrix inverse after adding one outer-product term.
//!
//! # Modules
//!
//! - [`error`]: Error types for oracle and optimizer failures
//! - [`oracle`]: Objective/gradient oracle interface and reference oracles
//! - [`state`]: Persistent optimizer state
//! - [`step_size`]: Step size scheduling
//! - [`types`]: Scalar trait and storage aliases

pub mod error;
pub mod oracle;
pub mod state;
pub mod step_size;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{OptimizerError, OptimizerResult, OracleError, OracleResult};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use rlsopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{OptimizerError, OptimizerResult, OracleError, OracleResult};
    pub use crate::oracle::{GradientOracle, LinearGradientOracle};
    pub use crate::state::RlsSgdState;
    pub use crate::step_size::StepSizeSchedule;
    pub use crate::types::{DMatrix, DVector, Scalar};
}
