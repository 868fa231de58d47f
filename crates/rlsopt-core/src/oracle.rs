//! Objective/gradient oracle interface.
//!
//! The optimizer treats the objective as an external black box: a single
//! capability that maps a parameter vector to an objective value and a
//! gradient. The oracle may be stochastic, as in minibatch training, and
//! the optimizer takes no expectation over its noise.
//!
//! Reference oracles used across the test suites live here as well, in the
//! same spirit as a quadratic test cost function shipping with the library.

use crate::{
    error::OracleResult,
    types::{DMatrix, DVector, Scalar},
};
use std::fmt::Debug;

/// Capability to evaluate an objective value and gradient at a point.
///
/// Implementations own whatever data the objective needs (model, batch
/// sampler, simulator handle). A stochastic oracle may return different
/// outputs for repeated calls at the same point; interior mutability is the
/// expected way to hold sampling state behind the `&self` receiver.
///
/// The returned gradient is an owned vector. Implementations must not hand
/// out references into internal buffers that later calls overwrite.
pub trait GradientOracle<T: Scalar>: Debug {
    /// Evaluates the objective and its gradient at a point.
    ///
    /// # Arguments
    ///
    /// * `point` - The parameter vector to evaluate at.
    ///
    /// # Returns
    ///
    /// A tuple of (value, gradient), where the gradient has the same length
    /// as `point`.
    fn evaluate(&self, point: &DVector<T>) -> OracleResult<(T, DVector<T>)>;

    /// Evaluates only the objective value at a point.
    ///
    /// # Default Implementation
    ///
    /// Calls `evaluate` and discards the gradient.
    fn value(&self, point: &DVector<T>) -> OracleResult<T> {
        self.evaluate(point).map(|(value, _)| value)
    }
}

/// Quadratic objective with an affine gradient field.
///
/// The objective value is the quadratic form `f(x) = x·(Ax)/2 + c·x` and
/// the reported gradient is `A·x + c`, which is the true gradient of `f`
/// whenever `A` is symmetric. For a nonsymmetric `A` the gradient map is
/// the defining quantity; this is what regression-equivalence tests need.
#[derive(Debug, Clone)]
pub struct LinearGradientOracle<T: Scalar> {
    matrix: DMatrix<T>,
    offset: DVector<T>,
}

impl<T: Scalar> LinearGradientOracle<T> {
    /// Creates an oracle with gradient `A·x + c`.
    ///
    /// # Panics
    ///
    /// Panics if `matrix` is not square or `offset` does not match its size.
    pub fn new(matrix: DMatrix<T>, offset: DVector<T>) -> Self {
        assert_eq!(matrix.nrows(), matrix.ncols(), "gradient matrix must be square");
        assert_eq!(matrix.nrows(), offset.len(), "offset length must match matrix size");
        Self { matrix, offset }
    }

    /// Creates the isotropic bowl of the given dimension: gradient `x`,
    /// value `|x|²/2`, minimum at the origin.
    pub fn simple(dim: usize) -> Self {
        Self {
            matrix: DMatrix::identity(dim, dim),
            offset: DVector::zeros(dim),
        }
    }

    /// The gradient matrix `A`.
    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    /// The gradient offset `c`.
    pub fn offset(&self) -> &DVector<T> {
        &self.offset
    }

    /// The parameter dimension this oracle expects.
    pub fn dimension(&self) -> usize {
        self.offset.len()
    }
}

impl<T: Scalar> GradientOracle<T> for LinearGradientOracle<T> {
    fn evaluate(&self, point: &DVector<T>) -> OracleResult<(T, DVector<T>)> {
        let ax = &self.matrix * point;
        let half = <T as Scalar>::from_f64(0.5);
        let value = point.dot(&ax) * half + self.offset.dot(point);
        let gradient = ax + &self.offset;
        Ok((value, gradient))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use self::test_oracles::{NoisyQuadratic, RecordingOracle};

#[cfg(any(test, feature = "test-utils"))]
mod test_oracles {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};
    use std::cell::RefCell;

    /// Quadratic oracle with seeded Gaussian gradient noise.
    ///
    /// Models a minibatch objective: the value is exact, each gradient
    /// entry is perturbed by `N(0, noise_std²)` noise drawn from an owned,
    /// deterministically seeded generator.
    #[derive(Debug)]
    pub struct NoisyQuadratic<T: Scalar> {
        clean: LinearGradientOracle<T>,
        noise_std: f64,
        rng: RefCell<StdRng>,
    }

    impl<T: Scalar> NoisyQuadratic<T> {
        /// Wraps a clean quadratic oracle with gradient noise of the given
        /// standard deviation, seeded for reproducibility.
        pub fn new(clean: LinearGradientOracle<T>, noise_std: f64, seed: u64) -> Self {
            Self {
                clean,
                noise_std,
                rng: RefCell::new(StdRng::seed_from_u64(seed)),
            }
        }
    }

    impl<T: Scalar> GradientOracle<T> for NoisyQuadratic<T> {
        fn evaluate(&self, point: &DVector<T>) -> OracleResult<(T, DVector<T>)> {
            let (value, mut gradient) = self.clean.evaluate(point)?;
            if self.noise_std > 0.0 {
                let normal = Normal::new(0.0, self.noise_std)
                    .expect("noise standard deviation must be finite and non-negative");
                let mut rng = self.rng.borrow_mut();
                for entry in gradient.iter_mut() {
                    *entry += <T as Scalar>::from_f64(normal.sample(&mut *rng));
                }
            }
            Ok((value, gradient))
        }
    }

    /// Decorator that records every evaluation point.
    ///
    /// Useful for reconstructing the exact sequence of regressors an online
    /// estimator saw, e.g. to compare against a batch solution.
    #[derive(Debug)]
    pub struct RecordingOracle<T: Scalar, O> {
        inner: O,
        points: RefCell<Vec<DVector<T>>>,
    }

    impl<T: Scalar, O: GradientOracle<T>> RecordingOracle<T, O> {
        /// Wraps an oracle, starting with an empty evaluation log.
        pub fn new(inner: O) -> Self {
            Self {
                inner,
                points: RefCell::new(Vec::new()),
            }
        }

        /// The recorded evaluation points, in call order.
        pub fn points(&self) -> Vec<DVector<T>> {
            self.points.borrow().clone()
        }

        /// Number of evaluations performed so far.
        pub fn count(&self) -> usize {
            self.points.borrow().len()
        }
    }

    impl<T: Scalar, O: GradientOracle<T>> GradientOracle<T> for RecordingOracle<T, O> {
        fn evaluate(&self, point: &DVector<T>) -> OracleResult<(T, DVector<T>)> {
            self.points.borrow_mut().push(point.clone());
            self.inner.evaluate(point)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_oracle_is_identity_gradient() {
        let oracle = LinearGradientOracle::<f64>::simple(3);
        let point = DVector::from_vec(vec![1.0, -2.0, 0.5]);

        let (value, gradient) = oracle.evaluate(&point).unwrap();

        assert_relative_eq!(value, (1.0 + 4.0 + 0.25) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(gradient, point, epsilon = 1e-12);
    }

    #[test]
    fn test_affine_gradient() {
        let matrix = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 0.5]);
        let offset = DVector::from_vec(vec![1.0, -1.0]);
        let oracle = LinearGradientOracle::new(matrix, offset);

        let point = DVector::from_vec(vec![3.0, 4.0]);
        let (_, gradient) = oracle.evaluate(&point).unwrap();

        assert_relative_eq!(gradient[0], 2.0 * 3.0 + 1.0, epsilon = 1e-12);
        assert_relative_eq!(gradient[1], 0.5 * 4.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_value_default_impl() {
        let oracle = LinearGradientOracle::<f64>::simple(2);
        let point = DVector::from_vec(vec![1.0, 1.0]);
        assert_relative_eq!(oracle.value(&point).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recording_oracle_logs_points() {
        let oracle = RecordingOracle::new(LinearGradientOracle::<f64>::simple(2));
        let a = DVector::from_vec(vec![1.0, 2.0]);
        let b = DVector::from_vec(vec![-1.0, 0.0]);

        oracle.evaluate(&a).unwrap();
        oracle.evaluate(&b).unwrap();

        assert_eq!(oracle.count(), 2);
        let points = oracle.points();
        assert_eq!(points[0], a);
        assert_eq!(points[1], b);
    }

    #[test]
    fn test_noisy_quadratic_zero_noise_matches_clean() {
        let clean = LinearGradientOracle::<f64>::simple(2);
        let noisy = NoisyQuadratic::new(clean.clone(), 0.0, 42);
        let point = DVector::from_vec(vec![0.5, -0.5]);

        let (v_clean, g_clean) = clean.evaluate(&point).unwrap();
        let (v_noisy, g_noisy) = noisy.evaluate(&point).unwrap();

        assert_relative_eq!(v_clean, v_noisy, epsilon = 1e-15);
        assert_relative_eq!(g_clean, g_noisy, epsilon = 1e-15);
    }

    #[test]
    fn test_noisy_quadratic_is_reproducible() {
        let point = DVector::from_vec(vec![1.0, 1.0]);

        let first = NoisyQuadratic::new(LinearGradientOracle::<f64>::simple(2), 0.1, 7);
        let second = NoisyQuadratic::new(LinearGradientOracle::<f64>::simple(2), 0.1, 7);

        let (_, g1) = first.evaluate(&point).unwrap();
        let (_, g2) = second.evaluate(&point).unwrap();
        assert_eq!(g1, g2);

        // A second draw from the same oracle differs from the first.
        let (_, g3) = first.evaluate(&point).unwrap();
        assert_ne!(g1, g3);
    }
}
