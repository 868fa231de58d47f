//! Type definitions and aliases for online stochastic optimization.
//!
//! This module provides the scalar trait abstracting over `f32`/`f64`,
//! together with the dynamically-sized vector and matrix aliases used by
//! the optimizer state and its rank-one update algebra.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the numeric traits required by the recursive
/// least-squares updates and the step-size arithmetic.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default tolerance for approximate comparisons.
    const DEFAULT_TOLERANCE: Self;

    /// Tolerance below which a Sherman-Morrison denominator is treated as
    /// singular and the corresponding rank-one update is skipped.
    const SINGULARITY_TOLERANCE: Self;

    /// Tolerance for checking that a matrix and its tracked transpose agree.
    const SYMMETRY_TOLERANCE: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a
    /// non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    ///
    /// Returns None if the conversion fails.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for logging/display).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Convert from usize (for evaluation counts).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_usize` for a
    /// non-panicking version.
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("Failed to convert from usize")
    }

    /// Try to convert from usize.
    ///
    /// Returns None if the conversion fails.
    fn try_from_usize(v: usize) -> Option<Self> {
        <Self as FromPrimitive>::from_usize(v)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-4;
    const SINGULARITY_TOLERANCE: Self = 1e-6;
    const SYMMETRY_TOLERANCE: Self = 1e-4;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-6;
    const SINGULARITY_TOLERANCE: Self = 1e-12;
    const SYMMETRY_TOLERANCE: Self = 1e-6;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;
