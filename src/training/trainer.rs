//! The training loop: row-steps, online label growth, early stopping.
//!
//! Training progress is an integer row-step counter; epoch-valued
//! parameters are converted once via `round(epochs * nrows)` so fractional
//! epochs and checkpoint schedules never accumulate floating-point drift.
//!
//! Row-steps run strictly in view order: every update must observe the
//! fully-applied mutations of the previous row for any bin they share.
//! Only weight-independent work (per-row hashing of the training and
//! validation views) fans out in parallel, before the loop.

use crate::data::{ColumnKind, DataView, Value};
use crate::error::FtrlError;
use crate::hash::{self, RowHasher};
use crate::inference::scores_from_bins;
use crate::model::importance::ImportanceTracker;
use crate::model::labels::LabelRegistry;
use crate::model::params::{FtrlParams, Interaction, ValidationParams};
use crate::model::scalar::{sigmoid, Scalar};
use crate::model::state::{ModelState, TargetFamily};
use crate::model::store::WeightStore;
use crate::parallel::Parallelism;

use super::loss::validation_loss;

// =============================================================================
// Targets
// =============================================================================

/// Target column values, materialized once per fit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Targets {
    Bool(Vec<Option<bool>>),
    Num(Vec<Option<f64>>),
    Cat(Vec<Option<String>>),
}

impl Targets {
    /// Read the single target column of a view, deciding the model family
    /// from its declared kind.
    ///
    /// A fully-missing (void) column trains the binomial family with every
    /// row skipped.
    pub(crate) fn extract(y: &dyn DataView) -> (TargetFamily, Targets) {
        let n_rows = y.n_rows();
        match y.col_kind(0) {
            ColumnKind::Bool => {
                let values = (0..n_rows)
                    .map(|r| match y.value(r, 0) {
                        Value::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect();
                (TargetFamily::Binomial, Targets::Bool(values))
            }
            ColumnKind::Void => (TargetFamily::Binomial, Targets::Bool(vec![None; n_rows])),
            ColumnKind::Int => {
                let values = (0..n_rows)
                    .map(|r| match y.value(r, 0) {
                        Value::Int(i) => Some(i as f64),
                        _ => None,
                    })
                    .collect();
                (TargetFamily::Regression, Targets::Num(values))
            }
            ColumnKind::Float => {
                let values = (0..n_rows)
                    .map(|r| match y.value(r, 0) {
                        Value::Float(x) => Some(x),
                        _ => None,
                    })
                    .collect();
                (TargetFamily::Regression, Targets::Num(values))
            }
            ColumnKind::Str => {
                let values = (0..n_rows)
                    .map(|r| match y.value(r, 0) {
                        Value::Str(s) => Some(s.to_owned()),
                        _ => None,
                    })
                    .collect();
                (TargetFamily::Multinomial, Targets::Cat(values))
            }
        }
    }
}

// =============================================================================
// FitContext
// =============================================================================

/// Immutable configuration shared across one `fit` call.
pub(crate) struct FitContext<'a> {
    pub params: &'a FtrlParams,
    pub interactions: &'a [Interaction],
    pub parallelism: Parallelism,
}

struct ValidationSet {
    bins: ndarray::Array2<u64>,
    targets: Targets,
    checkpoint_steps: u64,
}

// =============================================================================
// fit
// =============================================================================

/// Train on `x`/`y`, creating the model state on the first call and
/// continuing from it afterwards. Returns the epoch count processed.
///
/// All validation happens before any state is created or mutated.
pub(crate) fn fit<F: Scalar>(
    ctx: &FitContext<'_>,
    state_slot: &mut Option<ModelState<F>>,
    x: &dyn DataView,
    y: &dyn DataView,
    validation: Option<(&dyn DataView, &dyn DataView)>,
    validation_params: &ValidationParams,
) -> Result<f64, FtrlError> {
    // --- Eager validation: no partial mutation on failure. ---
    if x.n_cols() == 0 {
        return Err(FtrlError::EmptyTrainingFrame);
    }
    if y.n_cols() != 1 {
        return Err(FtrlError::TargetShape(y.n_cols()));
    }
    if y.n_rows() != x.n_rows() {
        return Err(FtrlError::RowCountMismatch {
            rows: x.n_rows(),
            targets: y.n_rows(),
        });
    }

    let (family, targets) = Targets::extract(y);

    let colnames: Vec<String> = (0..x.n_cols())
        .map(|c| x.col_name(c).to_owned())
        .collect();

    if let Some(state) = state_slot.as_ref() {
        if x.n_cols() != state.colnames.len() {
            return Err(FtrlError::ColumnCountMismatch {
                expected: state.colnames.len(),
                got: x.n_cols(),
            });
        }
        let names: Vec<&str> = colnames.iter().map(String::as_str).collect();
        state.check_colnames(&names)?;
        if family != state.family {
            return Err(FtrlError::TargetKindMismatch);
        }
    }

    let groups: Vec<Vec<usize>> = ctx
        .interactions
        .iter()
        .map(|i| i.resolve(&colnames))
        .collect::<Result<_, _>>()?;

    let val_data = match validation {
        Some((vx, vy)) => {
            validation_params.validate()?;
            if vx.n_cols() != x.n_cols() {
                return Err(FtrlError::ColumnCountMismatch {
                    expected: x.n_cols(),
                    got: vx.n_cols(),
                });
            }
            if vy.n_cols() != 1 {
                return Err(FtrlError::TargetShape(vy.n_cols()));
            }
            if vy.n_rows() != vx.n_rows() {
                return Err(FtrlError::RowCountMismatch {
                    rows: vx.n_rows(),
                    targets: vy.n_rows(),
                });
            }
            let (val_family, val_targets) = Targets::extract(vy);
            if val_family != family {
                return Err(FtrlError::TargetKindMismatch);
            }
            Some((vx, val_targets))
        }
        None => None,
    };

    // --- Create or continue the model state. ---
    if state_slot.is_none() {
        let labels = match family {
            TargetFamily::Multinomial => Some(LabelRegistry::categorical()),
            _ => None,
        };
        let mut importance_names = colnames.clone();
        importance_names.extend(ctx.interactions.iter().map(Interaction::name));
        *state_slot = Some(ModelState {
            store: WeightStore::new(ctx.params, 1),
            labels,
            importance: ImportanceTracker::new(importance_names),
            col_hashes: hash::column_hashes(x),
            colnames,
            family,
            target_name: y.col_name(0).to_owned(),
        });
    }
    let state = state_slot.as_mut().expect("model state exists after creation");

    let n_rows = x.n_rows();
    if n_rows == 0 {
        return Ok(ctx.params.nepochs);
    }
    let total_steps = (ctx.params.nepochs * n_rows as f64).round() as u64;
    if total_steps == 0 {
        return Ok(ctx.params.nepochs);
    }

    // --- Precompute bins; hashing never depends on the weights. ---
    let hasher = RowHasher::new(&state.col_hashes, &groups, ctx.params.nbins);
    let bins = hasher.compute_bins(x, ctx.parallelism);

    let val = val_data.map(|(vx, val_targets)| ValidationSet {
        bins: hasher.compute_bins(vx, ctx.parallelism),
        targets: val_targets,
        checkpoint_steps: ((validation_params.nepochs_validation * n_rows as f64).round()
            as u64)
            .max(1),
    });

    // --- Row-step loop: strictly sequential. ---
    let n_act = hasher.n_active();
    let mut n_slots = state.store.n_slots();
    let mut w_pre = vec![F::zero(); n_slots * n_act];
    let mut scores = vec![F::zero(); n_slots];
    let mut grads = vec![F::zero(); n_slots];
    let mut ys = vec![F::zero(); n_slots];
    let mut prev_loss: Option<f64> = None;

    for step in 0..total_steps {
        let row = (step % n_rows as u64) as usize;

        // Resolve the row's target; rows with a missing target advance the
        // step counter but never touch a bin.
        let row_target = match (&state.family, &targets) {
            (TargetFamily::Binomial, Targets::Bool(values)) => {
                values[row].map(|b| RowTarget::Scalar(if b { F::one() } else { F::zero() }))
            }
            (TargetFamily::Regression, Targets::Num(values)) => {
                values[row].map(|v| RowTarget::Scalar(F::from_f64(v)))
            }
            (TargetFamily::Multinomial, Targets::Cat(values)) => match &values[row] {
                None => None,
                Some(label) => {
                    let registry = state
                        .labels
                        .as_mut()
                        .expect("multinomial state has a registry");
                    // Lookup precedes registration: a label unseen at
                    // prediction time trains the catch-all slot too.
                    let (slot, newly_added) = registry.register(label);
                    if newly_added {
                        state.store.add_slot();
                        n_slots += 1;
                        w_pre.resize(n_slots * n_act, F::zero());
                        scores.resize(n_slots, F::zero());
                        grads.resize(n_slots, F::zero());
                        ys.resize(n_slots, F::zero());
                    }
                    Some(RowTarget::Label { slot, newly_added })
                }
            },
            _ => unreachable!("target storage does not match model family"),
        };

        if let Some(row_target) = row_target {
            let bins_row = bins.row(row);

            // Prediction phase: read every active weight once, before any
            // of this row's updates.
            for slot in 0..n_slots {
                let mut sum = F::zero();
                for (k, &bin) in bins_row.iter().enumerate() {
                    let w = state.store.weight(slot, bin as usize);
                    w_pre[slot * n_act + k] = w;
                    sum += w;
                }
                scores[slot] = sum;
            }

            match row_target {
                RowTarget::Scalar(y) => {
                    grads[0] = match state.family {
                        TargetFamily::Regression => scores[0] - y,
                        _ => sigmoid(scores[0]) - y,
                    };
                }
                RowTarget::Label { slot, newly_added } => {
                    for s in 0..n_slots {
                        ys[s] = if s == slot || (s == 0 && newly_added) {
                            F::one()
                        } else {
                            F::zero()
                        };
                        grads[s] = sigmoid(scores[s]) - ys[s];
                    }
                }
            }

            for slot in 0..n_slots {
                let g = grads[slot];
                for (k, &bin) in bins_row.iter().enumerate() {
                    state
                        .store
                        .update(slot, bin as usize, g, w_pre[slot * n_act + k]);
                }
            }

            for (k, &bin) in bins_row.iter().enumerate() {
                let mut delta = F::zero();
                for slot in 0..n_slots {
                    delta +=
                        (state.store.weight(slot, bin as usize) - w_pre[slot * n_act + k]).abs();
                }
                state.importance.accumulate(k, delta);
            }
            state.importance.count_row();
        }

        // Checkpoint: read-only scoring of the validation view.
        if let Some(val) = &val {
            if (step + 1) % val.checkpoint_steps == 0 {
                let val_scores = scores_from_bins(&state.store, &val.bins, ctx.parallelism);
                let loss = validation_loss(
                    state.family,
                    &val_scores,
                    &val.targets,
                    state.labels.as_ref(),
                );
                if let Some(prev) = prev_loss {
                    let improvement = if prev > 0.0 { (prev - loss) / prev } else { 0.0 };
                    if improvement < validation_params.validation_error {
                        let checkpoints = (step + 1) / val.checkpoint_steps;
                        return Ok(checkpoints as f64 * validation_params.nepochs_validation);
                    }
                }
                prev_loss = Some(loss);
            }
        }
    }

    Ok(ctx.params.nepochs)
}

/// One row's resolved target.
enum RowTarget<F> {
    /// Binomial 0/1 indicator or regression value.
    Scalar(F),
    /// Multinomial label slot; `newly_added` marks the row that first
    /// introduced the label.
    Label { slot: usize, newly_added: bool },
}
