//! Persisted model snapshots.
//!
//! Snapshots are plain serde structs mirroring the runtime types, wrapped in
//! a version-tagged enum: new format versions add variants rather than
//! changing existing ones. Bytes are encoded with postcard.
//!
//! A snapshot carries everything needed to resume incremental `fit` or
//! serve `predict` bit-identically: the parameter bundle, interaction
//! declarations, the model matrix at its native precision, label order,
//! trained column names, column-identity hashes, and the importance
//! accumulators.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::FtrlError;
use crate::model::importance::ImportanceTracker;
use crate::model::labels::LabelRegistry;
use crate::model::params::FtrlParams;
use crate::model::scalar::Scalar;
use crate::model::state::{ModelState, TargetFamily};
use crate::model::store::WeightStore;

// =============================================================================
// Payload types
// =============================================================================

/// Version-tagged snapshot for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Snapshot {
    /// Version 1 snapshot format.
    V1(SnapshotV1),
}

/// Version 1 snapshot structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotV1 {
    /// Parameter bundle; re-validated on restore.
    pub params: FtrlParams,
    /// Interaction groups, one name list per group in declaration order.
    pub interactions: Vec<Vec<String>>,
    /// Trained state, absent for an untrained model.
    pub model: Option<ModelPayload>,
}

/// Trained state at its native storage precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelPayload {
    Single(StatePayload<f32>),
    Double(StatePayload<f64>),
}

/// Flattened trained state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatePayload<F> {
    pub family: TargetFamily,
    pub target_name: String,
    pub colnames: Vec<String>,
    pub col_hashes: Vec<u64>,
    /// Registered labels in slot order; multinomial only.
    pub labels: Option<Vec<String>>,
    pub nbins: u64,
    pub n_slots: u32,
    /// `z` accumulators, slot-major `[n_slots * nbins]`.
    pub z: Vec<F>,
    /// `n` accumulators, slot-major `[n_slots * nbins]`.
    pub n: Vec<F>,
    pub importance_names: Vec<String>,
    pub importance_totals: Vec<F>,
    pub importance_rows: u64,
}

impl<F: Scalar> StatePayload<F> {
    /// Capture a live model state.
    pub(crate) fn capture(state: &ModelState<F>) -> Self {
        let (z, n) = state.store.to_parts();
        let (importance_names, importance_totals, importance_rows) =
            state.importance.to_parts();
        Self {
            family: state.family,
            target_name: state.target_name.clone(),
            colnames: state.colnames.clone(),
            col_hashes: state.col_hashes.clone(),
            labels: state.labels.as_ref().map(|r| r.labels().to_vec()),
            nbins: state.store.nbins() as u64,
            n_slots: state.store.n_slots() as u32,
            z,
            n,
            importance_names,
            importance_totals,
            importance_rows,
        }
    }

    /// Rebuild a model state, checking internal consistency.
    pub(crate) fn restore(self, params: &FtrlParams) -> Result<ModelState<F>, FtrlError> {
        let nbins = self.nbins as usize;
        let n_slots = self.n_slots as usize;

        if nbins != params.nbins {
            return Err(FtrlError::Decode(format!(
                "model has {} bins but params declare {}",
                nbins, params.nbins
            )));
        }
        if n_slots == 0 {
            return Err(FtrlError::Decode("model has no label slots".into()));
        }
        if self.z.len() != n_slots * nbins || self.n.len() != n_slots * nbins {
            return Err(FtrlError::Decode(format!(
                "accumulator length {}/{} does not match {} slots x {} bins",
                self.z.len(),
                self.n.len(),
                n_slots,
                nbins
            )));
        }
        if self.colnames.len() != self.col_hashes.len() {
            return Err(FtrlError::Decode(
                "column names and hashes disagree in length".into(),
            ));
        }
        if self.importance_totals.len() != self.importance_names.len() {
            return Err(FtrlError::Decode(
                "importance names and totals disagree in length".into(),
            ));
        }

        let labels = match (self.family, self.labels) {
            (TargetFamily::Multinomial, Some(labels)) => {
                if labels.len() != n_slots {
                    return Err(FtrlError::Decode(format!(
                        "{} labels for {} slots",
                        labels.len(),
                        n_slots
                    )));
                }
                Some(LabelRegistry::from_labels(labels))
            }
            (TargetFamily::Multinomial, None) => {
                return Err(FtrlError::Decode(
                    "multinomial model is missing its labels".into(),
                ));
            }
            (_, None) => None,
            (_, Some(_)) => {
                return Err(FtrlError::Decode(
                    "single-slot model carries labels".into(),
                ));
            }
        };

        let z = Array2::from_shape_vec((n_slots, nbins), self.z)
            .map_err(|e| FtrlError::Decode(e.to_string()))?;
        let n = Array2::from_shape_vec((n_slots, nbins), self.n)
            .map_err(|e| FtrlError::Decode(e.to_string()))?;

        Ok(ModelState {
            store: WeightStore::from_parts(params, z, n),
            labels,
            importance: ImportanceTracker::from_parts(
                self.importance_names,
                self.importance_totals,
                self.importance_rows,
            ),
            colnames: self.colnames,
            col_hashes: self.col_hashes,
            family: self.family,
            target_name: self.target_name,
        })
    }
}

// =============================================================================
// Byte codec
// =============================================================================

/// Encode a snapshot to postcard bytes.
pub(crate) fn to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, FtrlError> {
    postcard::to_allocvec(snapshot).map_err(|e| FtrlError::Encode(e.to_string()))
}

/// Decode a snapshot from postcard bytes.
pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Snapshot, FtrlError> {
    postcard::from_bytes(bytes).map_err(|e| FtrlError::Decode(e.to_string()))
}
