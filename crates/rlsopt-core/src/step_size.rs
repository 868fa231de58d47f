//! Step size scheduling for online stochastic optimization.
//!
//! A schedule maps the evaluation count k to the step size αₖ applied at
//! that call. Diminishing schedules balance early progress against final
//! precision; classical convergence theory for stochastic methods asks for
//! Σₖ αₖ = ∞ together with Σₖ αₖ² < ∞, which polynomial decay satisfies
//! when its power lies in (0.5, 1].
//!
//! The optimizer's default annealing, α₀ / (1 + k)^γ, is the polynomial
//! schedule with unit decay coefficient; see [`StepSizeSchedule::annealed`].

use crate::types::Scalar;
use num_traits::Float;

/// Step size schedules for optimization algorithms.
///
/// # Schedule Types
///
/// - **Constant**: αₖ = α₀. Requires careful initial selection; no decay.
/// - **Polynomial decay**: αₖ = α₀ / (1 + βk)ᵖ. Flexible decay with
///   convergence guarantees for p ∈ (0.5, 1].
/// - **Square root decay**: αₖ = α₀ / √(1 + k). The standard choice for
///   plain SGD on convex problems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSizeSchedule<T: Scalar> {
    /// Fixed step size αₖ = α₀ for all iterations.
    Constant(T),

    /// Polynomial decay: αₖ = α₀ / (1 + βk)ᵖ where β > 0, p ≥ 0.
    PolynomialDecay {
        /// Initial step size α₀
        initial: T,
        /// Decay coefficient β > 0, controls decay speed
        decay_rate: T,
        /// Decay power p ≥ 0
        power: T,
    },

    /// Square root decay: αₖ = α₀ / √(1 + k).
    SquareRootDecay {
        /// Initial step size α₀
        initial: T,
    },
}

impl<T: Scalar> StepSizeSchedule<T> {
    /// Computes the step size αₖ for evaluation count k.
    ///
    /// For k = 0 every schedule returns the initial step size α₀.
    pub fn get_step_size(&self, iteration: usize) -> T {
        let k = <T as Scalar>::from_usize(iteration);

        match self {
            Self::Constant(alpha) => *alpha,

            Self::PolynomialDecay {
                initial,
                decay_rate,
                power,
            } => *initial / <T as Float>::powf(T::one() + *decay_rate * k, *power),

            Self::SquareRootDecay { initial } => {
                *initial / <T as Float>::sqrt(T::one() + k)
            }
        }
    }

    /// Creates a constant step size schedule αₖ = α₀.
    pub fn constant(step_size: T) -> Self {
        Self::Constant(step_size)
    }

    /// Creates a polynomial decay schedule αₖ = α₀ / (1 + βk)ᵖ.
    pub fn polynomial_decay(initial: T, decay_rate: T, power: T) -> Self {
        Self::PolynomialDecay {
            initial,
            decay_rate,
            power,
        }
    }

    /// Creates a square root decay schedule αₖ = α₀ / √(1 + k).
    pub fn sqrt_decay(initial: T) -> Self {
        Self::SquareRootDecay { initial }
    }

    /// Creates the annealed schedule αₖ = α₀ / (1 + k)^γ.
    ///
    /// This is polynomial decay with unit decay coefficient, the form used
    /// by the RLS-preconditioned optimizer: strictly decreasing for γ > 0,
    /// constant for γ = 0.
    pub fn annealed(initial: T, power: T) -> Self {
        Self::PolynomialDecay {
            initial,
            decay_rate: T::one(),
            power,
        }
    }
}
