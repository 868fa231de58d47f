//! Online stochastic optimization with an RLS-estimated preconditioner.
//!
//! This crate provides a stateful stochastic gradient optimizer whose
//! curvature-aware preconditioner is maintained by online recursive least
//! squares between parameter iterates and observed gradients. The reported
//! solution is the Polyak running average of the raw iterates.
//!
//! # Example
//!
//! ```rust
//! use rlsopt_optim::{RlsSgd, RlsSgdConfig};
//! use rlsopt_core::oracle::LinearGradientOracle;
//! use rlsopt_core::state::RlsSgdState;
//! use rlsopt_core::types::DVector;
//!
//! let oracle = LinearGradientOracle::<f64>::simple(3);
//! let optimizer = RlsSgd::new(
//!     RlsSgdConfig::new()
//!         .with_learning_rate(0.5)
//!         .with_gamma(0.6),
//! );
//!
//! let mut x = DVector::from_vec(vec![1.0, -1.0, 0.5]);
//! let mut state = RlsSgdState::new();
//! let result = optimizer.step(&oracle, &mut x, &mut state).unwrap();
//! println!("objective at the pre-step point: {}", result.value);
//! ```

pub mod rls_sgd;

// Re-export the optimizer for convenience
pub use rls_sgd::{NumericalWarning, RlsSgd, RlsSgdConfig, StepResult};

// Re-export commonly used items from core
pub use rlsopt_core::{
    error::{OptimizerError, OptimizerResult, OracleError, OracleResult},
    oracle::GradientOracle,
    state::RlsSgdState,
    step_size::StepSizeSchedule,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        // Test that the optimizer can be created from re-exports
        let _config = RlsSgdConfig::<f64>::new();
        let _schedule = StepSizeSchedule::Constant(0.01_f64);
        let _state = RlsSgdState::<f64>::new();
    }
}
