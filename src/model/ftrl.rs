//! The public FTRL model facade.
//!
//! [`Ftrl`] owns the parameter bundle, the interaction declarations and the
//! trained state, and dispatches between the `f32` and `f64` engine
//! instantiations selected by `double_precision`. Parameters and
//! interactions lock while a trained model exists and unlock on
//! [`Ftrl::reset`].

use crate::data::{DataView, Frame};
use crate::error::FtrlError;
use crate::inference;
use crate::io::{self, ModelPayload, Snapshot, SnapshotV1, StatePayload};
use crate::parallel::Parallelism;
use crate::training::{fit, FitContext};

use super::params::{
    check_alpha, check_nbins, check_nepochs, check_non_negative, FtrlParams, Interaction,
    ValidationParams,
};
use super::state::ModelState;

// =============================================================================
// Ftrl
// =============================================================================

/// FTRL-Proximal online learner over hashed features.
///
/// # Example
///
/// ```
/// use ftrl::{Column, Frame, Ftrl};
///
/// let x = Frame::single(Column::from_ints("id", (0..10).collect()));
/// let y = Frame::single(Column::from_bools("y", vec![true; 10]));
///
/// let mut model = Ftrl::builder().alpha(0.1).nbins(10).build()?;
/// let epochs = model.fit(&x, &y)?;
/// assert_eq!(epochs, 1.0);
///
/// let scores = model.predict(&x)?;
/// assert_eq!(scores.n_rows(), 10);
/// # Ok::<(), ftrl::FtrlError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ftrl {
    params: FtrlParams,
    interactions: Vec<Interaction>,
    state: Option<ModelVariant>,
}

/// Trained state at its storage precision.
#[derive(Debug, Clone, PartialEq)]
enum ModelVariant {
    Single(ModelState<f32>),
    Double(ModelState<f64>),
}

impl Default for Ftrl {
    fn default() -> Self {
        Self::new()
    }
}

impl Ftrl {
    /// Model with default parameters.
    pub fn new() -> Self {
        Self {
            params: FtrlParams::default(),
            interactions: Vec::new(),
            state: None,
        }
    }

    /// Model from a full parameter bundle.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-domain parameter.
    pub fn with_params(params: FtrlParams) -> Result<Self, FtrlError> {
        params.validate()?;
        Ok(Self {
            params,
            interactions: Vec::new(),
            state: None,
        })
    }

    /// Builder accepting either a bundle or individual parameters.
    pub fn builder() -> FtrlBuilder {
        FtrlBuilder::default()
    }

    // =========================================================================
    // Parameter access
    // =========================================================================

    /// The current parameter bundle.
    pub fn params(&self) -> &FtrlParams {
        &self.params
    }

    pub fn alpha(&self) -> f64 {
        self.params.alpha
    }

    pub fn beta(&self) -> f64 {
        self.params.beta
    }

    pub fn lambda1(&self) -> f64 {
        self.params.lambda1
    }

    pub fn lambda2(&self) -> f64 {
        self.params.lambda2
    }

    pub fn nbins(&self) -> usize {
        self.params.nbins
    }

    pub fn nepochs(&self) -> f64 {
        self.params.nepochs
    }

    pub fn double_precision(&self) -> bool {
        self.params.double_precision
    }

    /// Declared interaction groups.
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Returns `true` once a fit has succeeded and until [`Ftrl::reset`].
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    fn ensure_unlocked(&self, name: &'static str) -> Result<(), FtrlError> {
        if self.state.is_some() {
            Err(FtrlError::Locked(name))
        } else {
            Ok(())
        }
    }

    /// Set `alpha`. Rejected while a trained model exists.
    pub fn set_alpha(&mut self, value: f64) -> Result<(), FtrlError> {
        self.ensure_unlocked("alpha")?;
        check_alpha(value)?;
        self.params.alpha = value;
        Ok(())
    }

    /// Set `beta`. Rejected while a trained model exists.
    pub fn set_beta(&mut self, value: f64) -> Result<(), FtrlError> {
        self.ensure_unlocked("beta")?;
        check_non_negative("beta", value)?;
        self.params.beta = value;
        Ok(())
    }

    /// Set `lambda1`. Rejected while a trained model exists.
    pub fn set_lambda1(&mut self, value: f64) -> Result<(), FtrlError> {
        self.ensure_unlocked("lambda1")?;
        check_non_negative("lambda1", value)?;
        self.params.lambda1 = value;
        Ok(())
    }

    /// Set `lambda2`. Rejected while a trained model exists.
    pub fn set_lambda2(&mut self, value: f64) -> Result<(), FtrlError> {
        self.ensure_unlocked("lambda2")?;
        check_non_negative("lambda2", value)?;
        self.params.lambda2 = value;
        Ok(())
    }

    /// Set `nbins`. Rejected while a trained model exists.
    pub fn set_nbins(&mut self, value: usize) -> Result<(), FtrlError> {
        self.ensure_unlocked("nbins")?;
        check_nbins(value)?;
        self.params.nbins = value;
        Ok(())
    }

    /// Set `nepochs`. Rejected while a trained model exists.
    pub fn set_nepochs(&mut self, value: f64) -> Result<(), FtrlError> {
        self.ensure_unlocked("nepochs")?;
        check_nepochs(value)?;
        self.params.nepochs = value;
        Ok(())
    }

    /// Set `double_precision`. Rejected while a trained model exists.
    pub fn set_double_precision(&mut self, value: bool) -> Result<(), FtrlError> {
        self.ensure_unlocked("double_precision")?;
        self.params.double_precision = value;
        Ok(())
    }

    /// Declare interaction groups, replacing any previous declaration.
    ///
    /// # Errors
    ///
    /// Rejected while a trained model exists, or if any group is empty.
    pub fn set_interactions<I>(&mut self, groups: I) -> Result<(), FtrlError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.ensure_unlocked("interactions")?;
        let interactions = groups
            .into_iter()
            .map(Interaction::new)
            .collect::<Result<Vec<_>, _>>()?;
        self.interactions = interactions;
        Ok(())
    }

    // =========================================================================
    // Fit / predict / reset
    // =========================================================================

    /// Train on `x` against the single-column target `y`.
    ///
    /// The first call creates the model; later calls continue from the
    /// current weights, labels and importance state. Returns the epoch
    /// count processed (`nepochs` when no early stopping applies).
    pub fn fit(&mut self, x: &dyn DataView, y: &dyn DataView) -> Result<f64, FtrlError> {
        self.fit_inner(x, y, None, &ValidationParams::default())
    }

    /// Train with early stopping against a validation view.
    ///
    /// Every `validation.nepochs_validation` epoch-equivalents the
    /// validation loss is computed; training stops when its relative
    /// improvement falls below `validation.validation_error`. The returned
    /// epoch count is then an exact multiple of `nepochs_validation`.
    pub fn fit_with_validation(
        &mut self,
        x: &dyn DataView,
        y: &dyn DataView,
        x_val: &dyn DataView,
        y_val: &dyn DataView,
        validation: ValidationParams,
    ) -> Result<f64, FtrlError> {
        self.fit_inner(x, y, Some((x_val, y_val)), &validation)
    }

    fn fit_inner(
        &mut self,
        x: &dyn DataView,
        y: &dyn DataView,
        validation: Option<(&dyn DataView, &dyn DataView)>,
        validation_params: &ValidationParams,
    ) -> Result<f64, FtrlError> {
        let ctx = FitContext {
            params: &self.params,
            interactions: &self.interactions,
            parallelism: Parallelism::from_threads(0),
        };
        // Precision follows the existing state; the parameter only applies
        // to the first fit (it locks together with the rest).
        match self.state.take() {
            Some(ModelVariant::Single(state)) => {
                let mut slot = Some(state);
                let result = fit(&ctx, &mut slot, x, y, validation, validation_params);
                if let Some(state) = slot {
                    self.state = Some(ModelVariant::Single(state));
                }
                result
            }
            Some(ModelVariant::Double(state)) => {
                let mut slot = Some(state);
                let result = fit(&ctx, &mut slot, x, y, validation, validation_params);
                if let Some(state) = slot {
                    self.state = Some(ModelVariant::Double(state));
                }
                result
            }
            None if self.params.double_precision => {
                let mut slot: Option<ModelState<f64>> = None;
                let result = fit(&ctx, &mut slot, x, y, validation, validation_params);
                if let Some(state) = slot {
                    self.state = Some(ModelVariant::Double(state));
                }
                result
            }
            None => {
                let mut slot: Option<ModelState<f32>> = None;
                let result = fit(&ctx, &mut slot, x, y, validation, validation_params);
                if let Some(state) = slot {
                    self.state = Some(ModelVariant::Single(state));
                }
                result
            }
        }
    }

    /// Score a view with the trained model.
    ///
    /// # Errors
    ///
    /// [`FtrlError::NotTrained`] before the first fit;
    /// [`FtrlError::ColumnCountMismatch`] if the view's column count
    /// differs from fit time.
    pub fn predict(&self, view: &dyn DataView) -> Result<Frame, FtrlError> {
        let parallelism = Parallelism::from_threads(0);
        match &self.state {
            None => Err(FtrlError::NotTrained),
            Some(ModelVariant::Single(state)) => {
                inference::predict(state, &self.interactions, view, parallelism)
            }
            Some(ModelVariant::Double(state)) => {
                inference::predict(state, &self.interactions, view, parallelism)
            }
        }
    }

    /// Clear the trained model, label registry and feature-importance
    /// state. Parameters and interactions remain and become mutable again.
    pub fn reset(&mut self) {
        self.state = None;
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// The trained model matrix as a frame: a `(z, n)` column pair per
    /// label slot, in slot order. `None` until trained.
    pub fn model(&self) -> Option<Frame> {
        match &self.state {
            None => None,
            Some(ModelVariant::Single(state)) => Some(state.model_frame()),
            Some(ModelVariant::Double(state)) => Some(state.model_frame()),
        }
    }

    /// The feature-importance table (`feature_name`,
    /// `feature_importance`), base features first, then interactions, in
    /// declared order. An owned snapshot, independent of the live model.
    pub fn feature_importances(&self) -> Option<Frame> {
        match &self.state {
            None => None,
            Some(ModelVariant::Single(state)) => Some(state.importance_frame()),
            Some(ModelVariant::Double(state)) => Some(state.importance_frame()),
        }
    }

    /// Column identity hashes, one per training column, in column order.
    pub fn colname_hashes(&self) -> Option<&[u64]> {
        match &self.state {
            None => None,
            Some(ModelVariant::Single(state)) => Some(&state.col_hashes),
            Some(ModelVariant::Double(state)) => Some(&state.col_hashes),
        }
    }

    /// Training column names seen at fit time.
    pub fn colnames(&self) -> Option<&[String]> {
        match &self.state {
            None => None,
            Some(ModelVariant::Single(state)) => Some(&state.colnames),
            Some(ModelVariant::Double(state)) => Some(&state.colnames),
        }
    }

    /// Registered labels in slot order (multinomial models only).
    pub fn labels(&self) -> Option<&[String]> {
        match &self.state {
            None => None,
            Some(ModelVariant::Single(state)) => {
                state.labels.as_ref().map(|r| r.labels())
            }
            Some(ModelVariant::Double(state)) => {
                state.labels.as_ref().map(|r| r.labels())
            }
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Capture the full persisted state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::V1(SnapshotV1 {
            params: self.params.clone(),
            interactions: self
                .interactions
                .iter()
                .map(|i| i.features().to_vec())
                .collect(),
            model: self.state.as_ref().map(|variant| match variant {
                ModelVariant::Single(state) => {
                    ModelPayload::Single(StatePayload::capture(state))
                }
                ModelVariant::Double(state) => {
                    ModelPayload::Double(StatePayload::capture(state))
                }
            }),
        })
    }

    /// Rebuild a model from a snapshot, re-validating everything.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, FtrlError> {
        let Snapshot::V1(snapshot) = snapshot;
        snapshot.params.validate()?;
        let interactions = snapshot
            .interactions
            .into_iter()
            .map(Interaction::new)
            .collect::<Result<Vec<_>, _>>()?;
        let state = match snapshot.model {
            None => None,
            Some(ModelPayload::Single(payload)) => {
                if snapshot.params.double_precision {
                    return Err(FtrlError::Decode(
                        "single-precision model with double_precision params".into(),
                    ));
                }
                Some(ModelVariant::Single(payload.restore(&snapshot.params)?))
            }
            Some(ModelPayload::Double(payload)) => {
                if !snapshot.params.double_precision {
                    return Err(FtrlError::Decode(
                        "double-precision model with single-precision params".into(),
                    ));
                }
                Some(ModelVariant::Double(payload.restore(&snapshot.params)?))
            }
        };
        Ok(Self {
            params: snapshot.params,
            interactions,
            state,
        })
    }

    /// Serialize to postcard bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FtrlError> {
        io::to_bytes(&self.snapshot())
    }

    /// Deserialize from postcard bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FtrlError> {
        Self::from_snapshot(io::from_bytes(bytes)?)
    }
}

// =============================================================================
// FtrlBuilder
// =============================================================================

/// Builder for [`Ftrl`]: pass a full parameter bundle *or* individual
/// parameters, never both.
#[derive(Debug, Default)]
pub struct FtrlBuilder {
    params: Option<FtrlParams>,
    alpha: Option<f64>,
    beta: Option<f64>,
    lambda1: Option<f64>,
    lambda2: Option<f64>,
    nbins: Option<usize>,
    nepochs: Option<f64>,
    double_precision: Option<bool>,
}

impl FtrlBuilder {
    /// Use a full parameter bundle.
    pub fn params(mut self, params: FtrlParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn alpha(mut self, value: f64) -> Self {
        self.alpha = Some(value);
        self
    }

    pub fn beta(mut self, value: f64) -> Self {
        self.beta = Some(value);
        self
    }

    pub fn lambda1(mut self, value: f64) -> Self {
        self.lambda1 = Some(value);
        self
    }

    pub fn lambda2(mut self, value: f64) -> Self {
        self.lambda2 = Some(value);
        self
    }

    pub fn nbins(mut self, value: usize) -> Self {
        self.nbins = Some(value);
        self
    }

    pub fn nepochs(mut self, value: f64) -> Self {
        self.nepochs = Some(value);
        self
    }

    pub fn double_precision(mut self, value: bool) -> Self {
        self.double_precision = Some(value);
        self
    }

    /// Build the model, validating all parameters.
    ///
    /// # Errors
    ///
    /// [`FtrlError::MixedParams`] when a bundle and individual parameters
    /// were both given; otherwise the first out-of-domain parameter.
    pub fn build(self) -> Result<Ftrl, FtrlError> {
        let has_individual = self.alpha.is_some()
            || self.beta.is_some()
            || self.lambda1.is_some()
            || self.lambda2.is_some()
            || self.nbins.is_some()
            || self.nepochs.is_some()
            || self.double_precision.is_some();

        let params = match (self.params, has_individual) {
            (Some(_), true) => return Err(FtrlError::MixedParams),
            (Some(params), false) => params,
            (None, _) => {
                let mut params = FtrlParams::default();
                if let Some(v) = self.alpha {
                    params.alpha = v;
                }
                if let Some(v) = self.beta {
                    params.beta = v;
                }
                if let Some(v) = self.lambda1 {
                    params.lambda1 = v;
                }
                if let Some(v) = self.lambda2 {
                    params.lambda2 = v;
                }
                if let Some(v) = self.nbins {
                    params.nbins = v;
                }
                if let Some(v) = self.nepochs {
                    params.nepochs = v;
                }
                if let Some(v) = self.double_precision {
                    params.double_precision = v;
                }
                params
            }
        };
        Ftrl::with_params(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    #[test]
    fn builder_rejects_mixed_construction() {
        let err = Ftrl::builder()
            .params(FtrlParams::default())
            .alpha(0.1)
            .build()
            .unwrap_err();
        assert_eq!(err, FtrlError::MixedParams);
    }

    #[test]
    fn builder_individual_fields() {
        let model = Ftrl::builder().alpha(1.0).nbins(5).build().unwrap();
        assert_eq!(model.alpha(), 1.0);
        assert_eq!(model.nbins(), 5);
        assert_eq!(model.beta(), 1.0);
    }

    #[test]
    fn builder_validates() {
        assert!(Ftrl::builder().alpha(-1.0).build().is_err());
        assert!(Ftrl::builder().nbins(0).build().is_err());
    }

    #[test]
    fn untrained_introspection_is_none() {
        let model = Ftrl::new();
        assert!(model.model().is_none());
        assert!(model.feature_importances().is_none());
        assert!(model.colname_hashes().is_none());
        assert!(model.labels().is_none());
        assert!(model.colnames().is_none());
        assert!(!model.is_trained());
    }

    #[test]
    fn setters_apply_before_training() {
        let mut model = Ftrl::new();
        model.set_alpha(1.0).unwrap();
        model.set_beta(2.0).unwrap();
        model.set_lambda1(3.0).unwrap();
        model.set_lambda2(4.0).unwrap();
        model.set_nbins(5).unwrap();
        model.set_nepochs(6.0).unwrap();
        model.set_double_precision(true).unwrap();
        assert_eq!(
            *model.params(),
            FtrlParams {
                alpha: 1.0,
                beta: 2.0,
                lambda1: 3.0,
                lambda2: 4.0,
                nbins: 5,
                nepochs: 6.0,
                double_precision: true,
            }
        );
    }

    #[test]
    fn empty_interaction_group_rejected() {
        let mut model = Ftrl::new();
        let err = model
            .set_interactions(vec![vec!["a".to_string()], vec![]])
            .unwrap_err();
        assert_eq!(err, FtrlError::EmptyInteraction);
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = Ftrl::new();
        let x = Frame::single(Column::from_ints("a", vec![1, 2, 3]));
        assert_eq!(model.predict(&x).unwrap_err(), FtrlError::NotTrained);
    }

    #[test]
    fn state_untouched_by_failed_fit() {
        let mut model = Ftrl::builder().nbins(8).build().unwrap();
        let x = Frame::single(Column::from_ints("a", vec![1, 2]));
        let y = Frame::single(Column::from_bools("y", vec![true, false]));
        model.fit(&x, &y).unwrap();
        let before = model.clone();

        // Mismatched column count fails eagerly.
        let bad = Frame::new(vec![
            Column::from_ints("a", vec![1]),
            Column::from_ints("b", vec![2]),
        ])
        .unwrap();
        let bad_y = Frame::single(Column::from_bools("y", vec![true]));
        assert!(model.fit(&bad, &bad_y).is_err());
        assert_eq!(model, before);
    }
}
