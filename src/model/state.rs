//! Trained model state shared by the trainer, predictor and snapshot codec.

use serde::{Deserialize, Serialize};

use crate::data::{Column, Frame};
use crate::error::FtrlError;

use super::importance::ImportanceTracker;
use super::labels::LabelRegistry;
use super::scalar::Scalar;
use super::store::WeightStore;

/// Model family implied by the target column's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFamily {
    /// Boolean (or fully-missing) target: single sigmoid slot.
    Binomial,
    /// Numeric target: single identity slot.
    Regression,
    /// String target: one sigmoid slot per registered label, normalized.
    Multinomial,
}

/// Everything a trained model owns besides its parameters and interaction
/// declarations.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelState<F> {
    pub store: WeightStore<F>,
    /// Present for [`TargetFamily::Multinomial`] only.
    pub labels: Option<LabelRegistry>,
    pub importance: ImportanceTracker<F>,
    /// Training column names, fixed at the first fit.
    pub colnames: Vec<String>,
    /// Column identity hashes, one per training column, in column order.
    pub col_hashes: Vec<u64>,
    pub family: TargetFamily,
    /// Name of the target column at the first fit; names single-column
    /// prediction output.
    pub target_name: String,
}

impl<F: Scalar> ModelState<F> {
    /// Labels for prediction output, in slot order.
    pub fn slot_names(&self) -> Vec<String> {
        match &self.labels {
            Some(registry) => registry.labels().to_vec(),
            None => vec![self.target_name.clone()],
        }
    }

    /// The model matrix as a frame: a `(z, n)` column pair per label slot,
    /// in slot order.
    pub fn model_frame(&self) -> Frame {
        let n_slots = self.store.n_slots();
        let mut columns = Vec::with_capacity(2 * n_slots);
        let slot_names = self.slot_names();
        for slot in 0..n_slots {
            let (z_name, n_name) = if n_slots == 1 {
                ("z".to_string(), "n".to_string())
            } else {
                (
                    format!("z_{}", slot_names[slot]),
                    format!("n_{}", slot_names[slot]),
                )
            };
            columns.push(Column::from_floats(
                &z_name,
                self.store.z_row(slot).iter().map(|v| (*v).to_f64()).collect(),
            ));
            columns.push(Column::from_floats(
                &n_name,
                self.store.n_row(slot).iter().map(|v| (*v).to_f64()).collect(),
            ));
        }
        Frame::new(columns).expect("slot columns share nbins rows")
    }

    /// The feature-importance table: `feature_name`, `feature_importance`.
    pub fn importance_frame(&self) -> Frame {
        let snapshot = self.importance.snapshot();
        let names: Vec<&str> = snapshot.iter().map(|(n, _)| n.as_str()).collect();
        let values: Vec<f64> = snapshot.iter().map(|(_, v)| (*v).to_f64()).collect();
        Frame::new(vec![
            Column::from_strs("feature_name", names),
            Column::from_floats("feature_importance", values),
        ])
        .expect("importance columns share entry count")
    }

    /// Check an incremental-fit or prediction view for column-name drift.
    pub fn check_colnames(&self, names: &[&str]) -> Result<(), FtrlError> {
        for (position, (expected, got)) in self.colnames.iter().zip(names).enumerate() {
            if expected != got {
                return Err(FtrlError::ColumnNameMismatch {
                    position,
                    expected: expected.clone(),
                    got: (*got).to_owned(),
                });
            }
        }
        Ok(())
    }
}
