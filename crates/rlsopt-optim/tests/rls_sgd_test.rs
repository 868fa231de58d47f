//! Integration tests for the RLS-preconditioned SGD optimizer

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rlsopt_core::{
    oracle::{GradientOracle, LinearGradientOracle, NoisyQuadratic, RecordingOracle},
    state::RlsSgdState,
    types::{DMatrix, DVector},
};
use rlsopt_optim::{RlsSgd, RlsSgdConfig};

/// The online estimator must agree with the closed-form batch solution of
/// the same regression problem under the identity prior, computed
/// independently via direct matrix inversion.
#[test]
fn test_online_estimator_matches_batch_solution() {
    let matrix = DMatrix::from_row_slice(
        3,
        3,
        &[2.0, 0.3, 0.0, 0.3, 1.0, 0.2, 0.0, 0.2, 0.5],
    );
    let offset = DVector::from_vec(vec![0.5, -0.25, 1.0]);
    let clean = LinearGradientOracle::new(matrix, offset);
    let oracle = RecordingOracle::new(clean.clone());

    let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.5));
    let mut x = DVector::from_vec(vec![1.0, -1.0, 0.5]);
    let mut state = RlsSgdState::new();

    let steps = 12;
    for _ in 0..steps {
        optimizer.step(&oracle, &mut x, &mut state).unwrap();
    }

    // Reassemble the regression problem the estimator saw: one intercept-
    // augmented row per evaluation point, the gradient there as target.
    let points = oracle.points();
    assert_eq!(points.len(), steps);
    let p = 3;
    let mut regressors = DMatrix::<f64>::zeros(steps, p + 1);
    let mut targets = DMatrix::<f64>::zeros(steps, p);
    for (i, point) in points.iter().enumerate() {
        for j in 0..p {
            regressors[(i, j)] = point[j];
        }
        regressors[(i, p)] = 1.0;
        let (_, gradient) = clean.evaluate(point).unwrap();
        for j in 0..p {
            targets[(i, j)] = gradient[j];
        }
    }

    let gram = DMatrix::identity(p + 1, p + 1) + regressors.transpose() * &regressors;
    let gram_inv = gram.try_inverse().unwrap();
    let batch_coefficients = &gram_inv * regressors.transpose() * &targets;

    assert_relative_eq!(
        *state.coefficients.as_ref().unwrap(),
        batch_coefficients,
        epsilon = 1e-9,
        max_relative = 1e-7
    );
    assert_relative_eq!(
        *state.covariance_inv.as_ref().unwrap(),
        gram_inv,
        epsilon = 1e-9,
        max_relative = 1e-7
    );
}

/// The reported point must equal the arithmetic mean of all working points
/// produced so far, at every call.
#[test]
fn test_reported_point_is_mean_of_working_points() {
    let matrix = DMatrix::from_row_slice(2, 2, &[1.5, 0.0, 0.0, 0.75]);
    let offset = DVector::from_vec(vec![0.3, -0.1]);
    let oracle = LinearGradientOracle::new(matrix, offset);
    let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.4));
    let mut x = DVector::from_vec(vec![2.0, -1.0]);
    let mut state = RlsSgdState::new();

    let mut sum = DVector::<f64>::zeros(2);
    for k in 1..=20 {
        optimizer.step(&oracle, &mut x, &mut state).unwrap();
        sum += state.parameters_slow.as_ref().unwrap();
        let mean = &sum / k as f64;
        assert_relative_eq!(x, mean, epsilon = 1e-10);
    }
}

/// Isotropic bowl scenario: gradient equals the point, minimum at the
/// origin. The reported point never moves away from the minimum once past
/// the transient, and the observed objective is non-increasing.
#[test]
fn test_isotropic_bowl_contracts_to_origin() {
    let oracle = LinearGradientOracle::<f64>::simple(2);
    let optimizer = RlsSgd::new(
        RlsSgdConfig::new()
            .with_learning_rate(1.0)
            .with_gamma(0.6),
    );
    let mut x = DVector::from_vec(vec![1.0, 1.0]);
    let mut state = RlsSgdState::new();

    let mut norms = Vec::new();
    let mut values = Vec::new();
    for _ in 0..50 {
        let result = optimizer.step(&oracle, &mut x, &mut state).unwrap();
        norms.push(x.norm());
        values.push(result.value);
    }

    assert_relative_eq!(values[0], 1.0, epsilon = 1e-12);
    for i in 9..norms.len() - 1 {
        assert!(
            norms[i + 1] <= norms[i] + 1e-12,
            "distance to the minimum increased at call {}",
            i + 1
        );
    }
    for i in 1..values.len() - 1 {
        assert!(
            values[i + 1] <= values[i] + 1e-12,
            "objective increased at call {}",
            i + 1
        );
    }
    assert!(*norms.last().unwrap() < 1e-8);
}

/// The effective step size is strictly decreasing for a positive annealing
/// exponent.
#[test]
fn test_annealed_step_size_decays() {
    let oracle = LinearGradientOracle::<f64>::simple(2);
    let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.3));
    let mut x = DVector::from_vec(vec![1.0, 1.0]);
    let mut state = RlsSgdState::new();

    let mut previous = f64::INFINITY;
    for n in 0..20 {
        let result = optimizer.step(&oracle, &mut x, &mut state).unwrap();
        assert!(result.step_size < previous);
        assert_relative_eq!(
            result.step_size,
            0.3 / (1.0 + n as f64).powf(0.6),
            epsilon = 1e-12
        );
        previous = result.step_size;
    }
}

/// A state survives across call batches and keeps accumulating.
#[test]
fn test_state_resumes_across_call_batches() {
    let oracle = LinearGradientOracle::<f64>::simple(2);
    let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.2));
    let mut x = DVector::from_vec(vec![1.0, -2.0]);
    let mut state = RlsSgdState::new();

    for _ in 0..5 {
        optimizer.step(&oracle, &mut x, &mut state).unwrap();
    }
    let coefficients_mid = state.coefficients.as_ref().unwrap().clone();

    for _ in 0..5 {
        optimizer.step(&oracle, &mut x, &mut state).unwrap();
    }

    assert_eq!(state.eval_count, 10);
    assert!(state.coefficients.as_ref().unwrap() != &coefficients_mid);
}

/// One hundred calls against a noisy minibatch-style oracle leave the state
/// finite and internally consistent.
#[test]
fn test_stochastic_oracle_smoke() {
    let oracle = NoisyQuadratic::new(LinearGradientOracle::<f64>::simple(2), 0.05, 42);
    let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.1));
    let mut x = DVector::from_vec(vec![1.0, -1.0]);
    let mut state = RlsSgdState::new();

    for _ in 0..100 {
        optimizer.step(&oracle, &mut x, &mut state).unwrap();
    }

    assert_eq!(state.eval_count, 100);
    assert!(x.iter().all(|v| v.is_finite()));
    for m in [
        state.covariance_inv.as_ref().unwrap(),
        state.coefficients.as_ref().unwrap(),
        state.curvature_inv.as_ref().unwrap(),
    ] {
        assert!(m.iter().all(|v| v.is_finite()));
    }
    let curv = state.curvature_inv.as_ref().unwrap();
    assert_relative_eq!(
        *state.curvature_inv_t.as_ref().unwrap(),
        curv.transpose(),
        epsilon = 1e-9,
        max_relative = 1e-9
    );
}

proptest! {
    /// Structural invariants hold for arbitrary dimensions and starting
    /// points: one counter tick per call, the tracked transpose agrees
    /// with the preconditioner, and the covariance inverse stays
    /// symmetric.
    #[test]
    fn prop_step_preserves_structure(
        (dim, initial, steps) in (1usize..=4).prop_flat_map(|dim| {
            (
                Just(dim),
                prop::collection::vec(-5.0f64..5.0, dim),
                1usize..=4,
            )
        })
    ) {
        let oracle = LinearGradientOracle::<f64>::simple(dim);
        let optimizer = RlsSgd::new(RlsSgdConfig::new().with_learning_rate(0.05));
        let mut x = DVector::from_vec(initial);
        let mut state = RlsSgdState::new();

        for _ in 0..steps {
            let result = optimizer.step(&oracle, &mut x, &mut state);
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(state.eval_count, steps);

        let curv = state.curvature_inv.as_ref().unwrap();
        let curv_t = state.curvature_inv_t.as_ref().unwrap();
        prop_assert!((curv_t - curv.transpose()).norm() <= 1e-9);

        let cov = state.covariance_inv.as_ref().unwrap();
        prop_assert!((cov - cov.transpose()).norm() <= 1e-9);
    }
}
