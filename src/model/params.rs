//! FTRL parameters, interaction declarations and validation knobs.
//!
//! Every parameter is validated eagerly: at construction, in setters, and
//! again when a serialized bundle is restored. Out-of-domain and non-finite
//! values are rejected with the offending field named.

use serde::{Deserialize, Serialize};

use crate::error::FtrlError;

// =============================================================================
// FtrlParams
// =============================================================================

/// FTRL-Proximal hyperparameters.
///
/// Immutable while a trained model exists; `reset()` makes them mutable
/// again.
///
/// # Example
///
/// ```
/// use ftrl::FtrlParams;
///
/// let params = FtrlParams {
///     alpha: 0.1,
///     nbins: 1 << 16,
///     ..Default::default()
/// };
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FtrlParams {
    /// Learning-rate scale. Must be finite and positive.
    pub alpha: f64,

    /// Learning-rate smoothing term. Must be finite and non-negative.
    pub beta: f64,

    /// L1 regularization (soft threshold on weights). Finite, non-negative.
    pub lambda1: f64,

    /// L2 regularization. Finite, non-negative.
    pub lambda2: f64,

    /// Width of the hash table; every feature hash is reduced modulo
    /// `nbins`. Must be positive.
    pub nbins: usize,

    /// Number of passes over the training data. May be fractional, causing
    /// a partial final pass. Finite, non-negative.
    pub nepochs: f64,

    /// Store all numeric model state as `f64` instead of `f32`.
    pub double_precision: bool,
}

impl Default for FtrlParams {
    fn default() -> Self {
        Self {
            alpha: 0.005,
            beta: 1.0,
            lambda1: 0.0,
            lambda2: 1.0,
            nbins: 1_000_000,
            nepochs: 1.0,
            double_precision: false,
        }
    }
}

impl FtrlParams {
    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-domain field as a descriptive error.
    pub fn validate(&self) -> Result<(), FtrlError> {
        check_alpha(self.alpha)?;
        check_non_negative("beta", self.beta)?;
        check_non_negative("lambda1", self.lambda1)?;
        check_non_negative("lambda2", self.lambda2)?;
        check_nbins(self.nbins)?;
        check_nepochs(self.nepochs)?;
        Ok(())
    }
}

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), FtrlError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FtrlError::NotFinite { name, value })
    }
}

pub(crate) fn check_alpha(value: f64) -> Result<(), FtrlError> {
    check_finite("alpha", value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(FtrlError::NotPositive {
            name: "alpha",
            value,
        })
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), FtrlError> {
    check_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(FtrlError::Negative { name, value })
    }
}

pub(crate) fn check_nbins(value: usize) -> Result<(), FtrlError> {
    if value > 0 {
        Ok(())
    } else {
        Err(FtrlError::NotPositive {
            name: "nbins",
            value: 0.0,
        })
    }
}

pub(crate) fn check_nepochs(value: f64) -> Result<(), FtrlError> {
    check_non_negative("nepochs", value)
}

// =============================================================================
// Interaction
// =============================================================================

/// A declared feature interaction: an ordered, non-empty group of base
/// feature names (repeats allowed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    features: Vec<String>,
}

impl Interaction {
    /// Create an interaction group.
    ///
    /// # Errors
    ///
    /// Returns [`FtrlError::EmptyInteraction`] for an empty group.
    pub fn new(features: Vec<String>) -> Result<Self, FtrlError> {
        if features.is_empty() {
            return Err(FtrlError::EmptyInteraction);
        }
        Ok(Self { features })
    }

    /// Member feature names, in declared order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Display name: members joined with `:`.
    pub fn name(&self) -> String {
        self.features.join(":")
    }

    /// Resolve member names to column indices of a training view.
    ///
    /// # Errors
    ///
    /// Names the first member missing from `colnames`.
    pub(crate) fn resolve(&self, colnames: &[String]) -> Result<Vec<usize>, FtrlError> {
        self.features
            .iter()
            .map(|f| {
                colnames
                    .iter()
                    .position(|c| c == f)
                    .ok_or_else(|| FtrlError::MissingInteractionFeature(f.clone()))
            })
            .collect()
    }
}

// =============================================================================
// ValidationParams
// =============================================================================

/// Early-stopping configuration for `fit_with_validation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationParams {
    /// Epoch-equivalents between validation checkpoints. May be fractional.
    /// Must be finite and positive.
    pub nepochs_validation: f64,

    /// Stop when the relative loss improvement between consecutive
    /// checkpoints falls below this threshold. Finite, non-negative.
    pub validation_error: f64,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            nepochs_validation: 1.0,
            validation_error: 0.01,
        }
    }
}

impl ValidationParams {
    pub fn validate(&self) -> Result<(), FtrlError> {
        check_finite("nepochs_validation", self.nepochs_validation)?;
        if self.nepochs_validation <= 0.0 {
            return Err(FtrlError::NotPositive {
                name: "nepochs_validation",
                value: self.nepochs_validation,
            });
        }
        check_non_negative("validation_error", self.validation_error)
    }
}
