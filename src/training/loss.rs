//! Validation losses for the early-stopping checkpoint.
//!
//! Classification targets use log-loss, regression uses mean squared error.
//! Losses accumulate in `f64` regardless of storage precision; rows with a
//! missing validation target are excluded.

use ndarray::Array2;

use crate::model::labels::LabelRegistry;
use crate::model::scalar::{sigmoid, Scalar};
use crate::model::state::TargetFamily;

use super::trainer::Targets;

const EPS: f64 = 1e-15;

/// Loss of raw per-slot scores against validation targets.
pub(crate) fn validation_loss<F: Scalar>(
    family: TargetFamily,
    scores: &Array2<F>,
    targets: &Targets,
    labels: Option<&LabelRegistry>,
) -> f64 {
    match (family, targets) {
        (TargetFamily::Binomial, Targets::Bool(ys)) => {
            let row = scores.row(0);
            let (sum, count) = ys
                .iter()
                .zip(row.iter())
                .filter_map(|(y, &s)| y.map(|y| (y, s)))
                .fold((0.0f64, 0usize), |(sum, count), (y, s)| {
                    let p = sigmoid(s).to_f64().clamp(EPS, 1.0 - EPS);
                    let y = y as u8 as f64;
                    (sum - (y * p.ln() + (1.0 - y) * (1.0 - p).ln()), count + 1)
                });
            mean(sum, count)
        }
        (TargetFamily::Regression, Targets::Num(ys)) => {
            let row = scores.row(0);
            let (sum, count) = ys
                .iter()
                .zip(row.iter())
                .filter_map(|(y, &s)| y.map(|y| (y, s)))
                .fold((0.0f64, 0usize), |(sum, count), (y, s)| {
                    let d = s.to_f64() - y;
                    (sum + d * d, count + 1)
                });
            mean(sum, count)
        }
        (TargetFamily::Multinomial, Targets::Cat(ys)) => {
            let registry = labels.expect("multinomial state has a registry");
            let mut sum = 0.0f64;
            let mut count = 0usize;
            for (row, y) in ys.iter().enumerate() {
                let Some(label) = y else { continue };
                // Labels unseen during training score as the catch-all.
                let slot = registry.slot_of(label).unwrap_or(0);
                let mut total = 0.0f64;
                let mut p_true = 0.0f64;
                for s in 0..scores.nrows() {
                    let p = sigmoid(scores[[s, row]]).to_f64();
                    total += p;
                    if s == slot {
                        p_true = p;
                    }
                }
                let p = if total > 0.0 { p_true / total } else { 0.0 };
                sum -= p.clamp(EPS, 1.0 - EPS).ln();
                count += 1;
            }
            mean(sum, count)
        }
        // Target extraction pairs each family with one storage variant.
        _ => unreachable!("target storage does not match model family"),
    }
}

#[inline]
fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}
