//! Storage-precision abstraction.
//!
//! The `double_precision` parameter selects 32- or 64-bit storage for all
//! numeric model state. The engine is generic over [`Scalar`] and the public
//! facade dispatches between the two instantiations.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Floating-point storage type for all numeric model state.
pub trait Scalar:
    ndarray::NdFloat + Serialize + DeserializeOwned + Default + 'static
{
    /// Convert from an `f64` parameter or target value.
    fn from_f64(v: f64) -> Self;

    /// Widen to `f64` for reporting and loss computation.
    fn to_f64(self) -> f64;
}

impl Scalar for f32 {
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

/// Logistic function in storage precision.
#[inline]
pub fn sigmoid<F: Scalar>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}
