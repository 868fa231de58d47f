//! Persistent state for the RLS-preconditioned optimizer.
//!
//! The state owns every quantity that survives across calls: the raw
//! working iterate, the recursive least-squares accumulators, the inverse
//! curvature estimate with its tracked transpose, and the evaluation
//! counter. Fields are held as `Option` so a state can be created before
//! the parameter dimension is known and initialized lazily on first use;
//! initialization never resets a field that already exists, which is what
//! makes resuming an optimization run across many calls work.

use crate::{
    error::{OptimizerError, OptimizerResult},
    types::{DMatrix, DVector, Scalar},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State for the RLS-preconditioned stochastic gradient optimizer.
///
/// For a parameter dimension p, the field shapes are:
///
/// - `parameters_slow`: length p, the raw (unaveraged) iterate;
/// - `covariance_inv`: (p+1)×(p+1), inverse covariance of the intercept-
///   augmented regressors seen so far, identity prior;
/// - `coefficients`: (p+1)×p, running least-squares coefficients mapping an
///   augmented regressor to a predicted gradient;
/// - `curvature_inv` / `curvature_inv_t`: p×p, the inverse curvature
///   estimate used as preconditioner and its tracked transpose.
///
/// The two counters record successful oracle evaluations and rank-one
/// updates skipped for numerical reasons.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RlsSgdState<T: Scalar> {
    /// Raw working iterate, mutated by every call
    pub parameters_slow: Option<DVector<T>>,

    /// Inverse covariance accumulator over augmented regressors
    pub covariance_inv: Option<DMatrix<T>>,

    /// Running least-squares coefficient matrix
    pub coefficients: Option<DMatrix<T>>,

    /// Inverse curvature estimate (the preconditioner)
    pub curvature_inv: Option<DMatrix<T>>,

    /// Transpose of the inverse curvature estimate, updated in lockstep
    pub curvature_inv_t: Option<DMatrix<T>>,

    /// Number of oracle evaluations performed
    pub eval_count: usize,

    /// Number of rank-one updates skipped due to near-singular denominators
    pub instability_events: usize,
}

impl<T: Scalar> RlsSgdState<T> {
    /// Creates an empty state; fields are initialized on first use.
    pub fn new() -> Self {
        Self {
            parameters_slow: None,
            covariance_inv: None,
            coefficients: None,
            curvature_inv: None,
            curvature_inv_t: None,
            eval_count: 0,
            instability_events: 0,
        }
    }

    /// Creates a state with the matrix fields eagerly initialized for the
    /// given parameter dimension.
    ///
    /// The working iterate is still seeded from the caller's point on the
    /// first call, so the state is usable exactly like a fresh one.
    pub fn with_dimension(num_parameters: usize) -> Self {
        let p = num_parameters;
        Self {
            parameters_slow: None,
            covariance_inv: Some(DMatrix::identity(p + 1, p + 1)),
            coefficients: Some(DMatrix::zeros(p + 1, p)),
            curvature_inv: Some(DMatrix::identity(p, p)),
            curvature_inv_t: Some(DMatrix::identity(p, p)),
            eval_count: 0,
            instability_events: 0,
        }
    }

    /// Lazily initializes every absent field for the dimension of `x`.
    ///
    /// Fields that already exist are left untouched. The working iterate,
    /// when absent, is seeded with a copy of `x`.
    pub fn ensure_initialized(&mut self, x: &DVector<T>) {
        let p = x.len();
        if self.parameters_slow.is_none() {
            self.parameters_slow = Some(x.clone());
        }
        if self.covariance_inv.is_none() {
            self.covariance_inv = Some(DMatrix::identity(p + 1, p + 1));
        }
        if self.coefficients.is_none() {
            self.coefficients = Some(DMatrix::zeros(p + 1, p));
        }
        if self.curvature_inv.is_none() {
            self.curvature_inv = Some(DMatrix::identity(p, p));
        }
        if self.curvature_inv_t.is_none() {
            self.curvature_inv_t = Some(DMatrix::identity(p, p));
        }
    }

    /// The parameter dimension this state was initialized for, if any.
    pub fn num_parameters(&self) -> Option<usize> {
        if let Some(slow) = &self.parameters_slow {
            return Some(slow.len());
        }
        if let Some(g) = &self.curvature_inv {
            return Some(g.nrows());
        }
        if let Some(b) = &self.coefficients {
            return Some(b.ncols());
        }
        self.covariance_inv.as_ref().map(|p| p.nrows() - 1)
    }

    /// Checks that this state is compatible with a point of length
    /// `expected`.
    ///
    /// A fresh state is compatible with any dimension.
    pub fn check_dimension(&self, expected: usize) -> OptimizerResult<()> {
        match self.num_parameters() {
            Some(actual) if actual != expected => Err(OptimizerError::dimension_mismatch(
                format!("point of length {}", actual),
                format!("point of length {}", expected),
            )),
            _ => Ok(()),
        }
    }

    /// True once every persistent field has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.parameters_slow.is_some()
            && self.covariance_inv.is_some()
            && self.coefficients.is_some()
            && self.curvature_inv.is_some()
            && self.curvature_inv_t.is_some()
    }

    /// Resets the state to fresh, discarding all accumulated information.
    pub fn reset(&mut self) {
        self.parameters_slow = None;
        self.covariance_inv = None;
        self.coefficients = None;
        self.curvature_inv = None;
        self.curvature_inv_t = None;
        self.eval_count = 0;
        self.instability_events = 0;
    }

    /// Returns a summary of the current state as key-value pairs.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut summary = HashMap::new();
        summary.insert("eval_count".to_string(), self.eval_count.to_string());
        summary.insert(
            "instability_events".to_string(),
            self.instability_events.to_string(),
        );
        summary.insert(
            "num_parameters".to_string(),
            self.num_parameters()
                .map_or_else(|| "unset".to_string(), |p| p.to_string()),
        );
        summary.insert(
            "initialized".to_string(),
            self.is_initialized().to_string(),
        );
        summary
    }
}

impl<T: Scalar> Default for RlsSgdState<T> {
    fn default() -> Self {
        Self::new()
    }
}
