//! Prediction: raw per-slot scores and per-family output transforms.
//!
//! Scoring reads the weight store without mutating it, so rows fan out
//! freely. The same scoring path serves user-facing `predict` and the
//! trainer's validation checkpoints.

use ndarray::{Array2, Axis};

use crate::data::{Column, DataView, Frame};
use crate::error::FtrlError;
use crate::model::params::Interaction;
use crate::model::scalar::{sigmoid, Scalar};
use crate::model::state::{ModelState, TargetFamily};
use crate::model::store::WeightStore;
use crate::parallel::Parallelism;

/// Raw pre-activation scores `[n_slots, n_rows]` from precomputed bins.
pub(crate) fn scores_from_bins<F: Scalar>(
    store: &WeightStore<F>,
    bins: &Array2<u64>,
    parallelism: Parallelism,
) -> Array2<F> {
    let n_rows = bins.nrows();
    let n_slots = store.n_slots();
    let mut scores = Array2::<F>::zeros((n_slots, n_rows));

    parallelism.maybe_par_bridge_for_each(
        scores.axis_iter_mut(Axis(1)).enumerate(),
        |(row, mut out)| {
            let bins_row = bins.row(row);
            for slot in 0..n_slots {
                let mut sum = F::zero();
                for &bin in bins_row.iter() {
                    sum += store.weight(slot, bin as usize);
                }
                out[slot] = sum;
            }
        },
    );
    scores
}

/// Score a view with a trained model.
///
/// Output column layout depends on the target family: one identity column
/// (regression), one sigmoid column (binomial), or one normalized sigmoid
/// column per registered label in registry order (multinomial).
pub(crate) fn predict<F: Scalar>(
    state: &ModelState<F>,
    interactions: &[Interaction],
    view: &dyn DataView,
    parallelism: Parallelism,
) -> Result<Frame, FtrlError> {
    if view.n_cols() != state.colnames.len() {
        return Err(FtrlError::ColumnCountMismatch {
            expected: state.colnames.len(),
            got: view.n_cols(),
        });
    }

    // Interactions were resolved at fit time and are locked while trained;
    // prediction views are positional, so resolve against the trained names.
    let groups: Vec<Vec<usize>> = interactions
        .iter()
        .map(|i| i.resolve(&state.colnames))
        .collect::<Result<_, _>>()?;

    let hasher = crate::hash::RowHasher::new(&state.col_hashes, &groups, state.store.nbins());
    let bins = hasher.compute_bins(view, parallelism);
    let scores = scores_from_bins(&state.store, &bins, parallelism);
    let n_rows = view.n_rows();

    let columns = match state.family {
        TargetFamily::Regression => {
            let values = scores.row(0).iter().map(|s| (*s).to_f64()).collect();
            vec![Column::from_floats(&state.target_name, values)]
        }
        TargetFamily::Binomial => {
            let values = scores
                .row(0)
                .iter()
                .map(|&s| sigmoid(s).to_f64())
                .collect();
            vec![Column::from_floats(&state.target_name, values)]
        }
        TargetFamily::Multinomial => {
            let n_slots = state.store.n_slots();
            let mut probs = Array2::<F>::zeros((n_slots, n_rows));
            for row in 0..n_rows {
                let mut total = F::zero();
                for slot in 0..n_slots {
                    let p = sigmoid(scores[[slot, row]]);
                    probs[[slot, row]] = p;
                    total += p;
                }
                if total > F::zero() {
                    for slot in 0..n_slots {
                        probs[[slot, row]] /= total;
                    }
                }
            }
            state
                .slot_names()
                .iter()
                .enumerate()
                .map(|(slot, name)| {
                    Column::from_floats(
                        name,
                        probs.row(slot).iter().map(|p| (*p).to_f64()).collect(),
                    )
                })
                .collect()
        }
    };

    Ok(Frame::new(columns).expect("prediction columns share the row count"))
}
