//! Stochastic gradient descent with an online RLS-estimated preconditioner.
//!
//! This module implements an online optimizer that augments plain gradient
//! descent with a curvature-aware preconditioner maintained by recursive
//! least squares. Between calls, the optimizer regresses observed gradients
//! on intercept-augmented parameter iterates; the inverse of the linear
//! block of that regression is tracked incrementally and applied to each
//! gradient before stepping.
//!
//! # Algorithm Overview
//!
//! Each call performs, in order:
//! 1. Evaluate the external oracle at the current working point.
//! 2. Step the working point with the annealed rate through the current
//!    (pre-update) preconditioner.
//! 3. Fold the working point into the running Polyak average, which is the
//!    reported solution.
//! 4. Refresh the regression and its inverse-curvature companion with two
//!    chained Sherman-Morrison rank-one downdates.
//!
//! All matrix work is O(p²) per call. No linear system is ever solved and
//! no matrix is ever inverted explicitly; both inverses are maintained
//! purely by rank-one recursions.
//!
//! # Mathematical Foundation
//!
//! With augmented regressor x₁ = [w; 1], gradient observation y, inverse
//! covariance P and coefficients B, the exact recursive least-squares step
//! is
//!
//! ```text
//! a = 1 + x₁·P x₁,   α = 1/a
//! B ← B + α·(P x₁)·(y − Bᵀx₁)ᵀ
//! P ← P − α·(P x₁)·(P x₁)ᵀ
//! ```
//!
//! so that after k observations P = (I + Σ x₁x₁ᵀ)⁻¹ and B is the ridge
//! solution with identity prior. The same algebra, applied one level down
//! with u = α·(P x₁)[0..p] and the residual v, keeps the preconditioner G
//! tracking the inverse of the regression's linear block, and its tracked
//! transpose Gᵗ follows by mirroring each update.

use rlsopt_core::{
    error::{OptimizerError, OptimizerResult, OracleError},
    oracle::GradientOracle,
    state::RlsSgdState,
    step_size::StepSizeSchedule,
    types::{DVector, Scalar},
};
use num_traits::Float;

/// Configuration for the RLS-preconditioned SGD optimizer.
#[derive(Debug, Clone)]
pub struct RlsSgdConfig<T>
where
    T: Scalar,
{
    /// Base learning rate, must be positive
    pub learning_rate: T,

    /// Annealing exponent in [0, 1); the rate at call n is
    /// `learning_rate / (1 + n)^gamma`
    pub gamma: T,

    /// Number of initial calls that take a plain gradient step.
    ///
    /// With the default of 0 every call applies the preconditioner from
    /// the start. When positive, the first `warmup_steps` calls step along
    /// the raw gradient while the regression keeps accumulating
    /// observations, and the preconditioner kicks in afterwards. Both
    /// behaviors are in use; neither is canonical.
    pub warmup_steps: usize,
}

impl<T> Default for RlsSgdConfig<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            learning_rate: T::one(),
            gamma: <T as Scalar>::from_f64(0.60),
            warmup_steps: 0,
        }
    }
}

impl<T> RlsSgdConfig<T>
where
    T: Scalar,
{
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base learning rate.
    pub fn with_learning_rate(mut self, learning_rate: T) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the annealing exponent.
    pub fn with_gamma(mut self, gamma: T) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the plain-gradient warm-up length.
    pub fn with_warmup_steps(mut self, warmup_steps: usize) -> Self {
        self.warmup_steps = warmup_steps;
        self
    }

    /// The annealing schedule `learning_rate / (1 + n)^gamma`.
    pub fn schedule(&self) -> StepSizeSchedule<T> {
        StepSizeSchedule::annealed(self.learning_rate, self.gamma)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.learning_rate <= T::zero() || !<T as Float>::is_finite(self.learning_rate) {
            return Err(OptimizerError::invalid_configuration(
                "must be positive and finite",
                "learning_rate",
                format!("{}", self.learning_rate),
            ));
        }
        if self.gamma < T::zero() || self.gamma >= T::one() || !<T as Float>::is_finite(self.gamma)
        {
            return Err(OptimizerError::invalid_configuration(
                "must lie in [0, 1)",
                "gamma",
                format!("{}", self.gamma),
            ));
        }
        Ok(())
    }
}

/// Recoverable numerical condition reported by a step.
///
/// A near-singular Sherman-Morrison denominator means the corresponding
/// rank-one update cannot be applied without corrupting the state, so the
/// update is skipped for that call and the condition is reported here
/// instead of injecting non-finite values into the matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericalWarning {
    /// The covariance denominator was near zero; the whole estimator
    /// update was skipped for this call.
    CovarianceDowndateSkipped,

    /// The inverse-curvature denominator was near zero; the regression was
    /// updated but the preconditioner was left untouched.
    CurvatureDowndateSkipped,
}

/// Outcome of a single optimizer call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult<T>
where
    T: Scalar,
{
    /// Objective value observed at the pre-update working point.
    ///
    /// This lags the reported average by one call; convergence logging
    /// based on it must account for the lag.
    pub value: T,

    /// The annealed step size used by this call
    pub step_size: T,

    /// Numerical condition encountered, if any
    pub warning: Option<NumericalWarning>,
}

/// Stochastic gradient descent preconditioned by online recursive least
/// squares.
///
/// The optimizer owns no state; all persistent quantities live in the
/// caller's [`RlsSgdState`], which is created fresh for each logical
/// optimization run and reused across calls. The caller's `x` is
/// overwritten on every call with the running average of the raw iterates,
/// which is the reported solution.
///
/// # Examples
///
/// ```rust
/// use rlsopt_optim::{RlsSgd, RlsSgdConfig};
/// use rlsopt_core::oracle::LinearGradientOracle;
/// use rlsopt_core::state::RlsSgdState;
/// use rlsopt_core::types::DVector;
///
/// let oracle = LinearGradientOracle::<f64>::simple(2);
/// let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.5));
///
/// let mut x = DVector::from_vec(vec![1.0, -1.0]);
/// let mut state = RlsSgdState::new();
/// for _ in 0..10 {
///     let result = optimizer.step(&oracle, &mut x, &mut state).unwrap();
///     assert!(result.step_size > 0.0);
/// }
/// assert_eq!(state.eval_count, 10);
/// ```
#[derive(Debug, Clone)]
pub struct RlsSgd<T>
where
    T: Scalar,
{
    config: RlsSgdConfig<T>,
}

impl<T> RlsSgd<T>
where
    T: Scalar,
{
    /// Creates a new optimizer with the given configuration.
    pub fn new(config: RlsSgdConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the optimizer configuration.
    pub fn config(&self) -> &RlsSgdConfig<T> {
        &self.config
    }

    /// Returns the optimizer name.
    pub fn name(&self) -> &str {
        "RLS-SGD"
    }

    /// Performs a single optimization call.
    ///
    /// Evaluates the oracle once at the current working point, advances the
    /// working point through the current preconditioner with the annealed
    /// step size, overwrites `x` with the running average of all working
    /// points so far, and refreshes the curvature estimate.
    ///
    /// On the first call for a fresh state, `x` seeds the working point.
    /// If the oracle fails or returns non-finite output, the error is
    /// propagated and the state is left unmodified.
    ///
    /// # Arguments
    ///
    /// * `oracle` - The objective/gradient oracle.
    /// * `x` - In/out: overwritten with the averaged iterate.
    /// * `state` - Persistent state, mutated in place.
    ///
    /// # Returns
    ///
    /// A [`StepResult`] with the objective value observed at the
    /// pre-update point.
    pub fn step<O>(
        &self,
        oracle: &O,
        x: &mut DVector<T>,
        state: &mut RlsSgdState<T>,
    ) -> OptimizerResult<StepResult<T>>
    where
        O: GradientOracle<T>,
    {
        self.config.validate()?;
        let p = x.len();
        state.check_dimension(p)?;

        // The oracle sees the raw working point, not the average; on a
        // fresh state that is the caller's x. Evaluation happens before any
        // state mutation so a failing oracle leaves the state untouched.
        let eval_point: &DVector<T> = match &state.parameters_slow {
            Some(slow) => slow,
            None => x,
        };
        let (value, gradient) = oracle.evaluate(eval_point)?;
        if !<T as Float>::is_finite(value) {
            return Err(OracleError::NonFiniteValue.into());
        }
        if gradient.len() != p {
            return Err(OptimizerError::dimension_mismatch(
                format!("gradient of length {}", p),
                format!("gradient of length {}", gradient.len()),
            ));
        }
        if let Some(index) = gradient.iter().position(|g| !<T as Float>::is_finite(*g)) {
            return Err(OracleError::NonFiniteGradient { index }.into());
        }

        state.ensure_initialized(x);
        let n = state.eval_count;
        let step_size = self.config.schedule().get_step_size(n);
        state.eval_count += 1;

        let (Some(slow), Some(cov), Some(coeff), Some(curv), Some(curv_t)) = (
            state.parameters_slow.as_mut(),
            state.covariance_inv.as_mut(),
            state.coefficients.as_mut(),
            state.curvature_inv.as_mut(),
            state.curvature_inv_t.as_mut(),
        ) else {
            return Err(OptimizerError::invalid_state(
                "optimizer state incomplete after initialization",
            ));
        };

        // Augmented regressor at the point the gradient was observed,
        // captured before the working point moves.
        let mut regressor = DVector::zeros(p + 1);
        regressor.rows_mut(0, p).copy_from(slow);
        regressor[p] = T::one();

        // Symmetrized quasi-Newton step through the preconditioner as it
        // stood before this call's curvature update.
        let half = <T as Scalar>::from_f64(0.5);
        if n < self.config.warmup_steps {
            slow.axpy(-step_size, &gradient, T::one());
        } else {
            let preconditioned = &*curv * &gradient;
            let preconditioned_t = &*curv_t * &gradient;
            slow.axpy(-(step_size * half), &preconditioned, T::one());
            slow.axpy(-(step_size * half), &preconditioned_t, T::one());
        }

        // Running equal-weight mean of all working points produced so far.
        let n_t = <T as Scalar>::from_usize(n);
        let k_t = <T as Scalar>::from_usize(n + 1);
        x.axpy(T::one() / k_t, slow, n_t / k_t);

        // Recursive least-squares downdate of the covariance inverse and
        // coefficients.
        let px = &*cov * &regressor;
        let denom_cov = T::one() + regressor.dot(&px);
        if <T as Float>::abs(denom_cov) <= T::SINGULARITY_TOLERANCE {
            state.instability_events += 1;
            return Ok(StepResult {
                value,
                step_size,
                warning: Some(NumericalWarning::CovarianceDowndateSkipped),
            });
        }
        let alpha = T::one() / denom_cov;
        // Leading p entries of P·x₁, taken before P is downdated.
        let u = px.rows(0, p) * alpha;
        // Prediction residual of the regression at this observation.
        let residual = &gradient - coeff.tr_mul(&regressor);
        *coeff += (&px * residual.transpose()) * alpha;
        *cov -= (&px * px.transpose()) * alpha;

        // Mirror the same algebra one level down to keep the inverse
        // curvature estimate current; both products use the pre-update
        // matrices, and the tracked transpose receives the mirrored update.
        let gu = &*curv * &u;
        let gv = &*curv_t * &residual;
        let denom_curv = T::one() + residual.dot(&gu);
        let warning = if <T as Float>::abs(denom_curv) <= T::SINGULARITY_TOLERANCE {
            state.instability_events += 1;
            Some(NumericalWarning::CurvatureDowndateSkipped)
        } else {
            let beta = T::one() / denom_curv;
            *curv -= (&gu * gv.transpose()) * beta;
            *curv_t -= (&gv * gu.transpose()) * beta;
            None
        };

        Ok(StepResult {
            value,
            step_size,
            warning,
        })
    }
}

impl<T> Default for RlsSgd<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new(RlsSgdConfig::default())
    }
}
