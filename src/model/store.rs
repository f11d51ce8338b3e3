//! The weight store: `(z, n)` accumulator pairs per (bin, label slot).
//!
//! The accumulators are the only persisted numeric state; the effective
//! weight is a pure function of `(z, n)` recomputed on demand, never stored.
//!
//! # Storage Layout
//!
//! Slot-major: `z` and `n` are `[n_slots, nbins]` matrices, so each slot's
//! accumulators across all bins are contiguous. Growing by one label appends
//! a zero row to each matrix; existing slots keep their indices and values.

use ndarray::{Array1, Array2};

use super::params::FtrlParams;
use super::scalar::Scalar;

/// Dense `(z, n)` accumulator matrix with the FTRL-Proximal update rule.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightStore<F> {
    z: Array2<F>,
    n: Array2<F>,
    // Update constants in storage precision.
    alpha: F,
    beta: F,
    lambda1: F,
    lambda2: F,
}

impl<F: Scalar> WeightStore<F> {
    /// Zero-initialized store with `n_slots` label slots.
    pub fn new(params: &FtrlParams, n_slots: usize) -> Self {
        Self {
            z: Array2::zeros((n_slots, params.nbins)),
            n: Array2::zeros((n_slots, params.nbins)),
            alpha: F::from_f64(params.alpha),
            beta: F::from_f64(params.beta),
            lambda1: F::from_f64(params.lambda1),
            lambda2: F::from_f64(params.lambda2),
        }
    }

    /// Rebuild from raw accumulators (snapshot restore).
    pub(crate) fn from_parts(params: &FtrlParams, z: Array2<F>, n: Array2<F>) -> Self {
        debug_assert_eq!(z.dim(), n.dim());
        Self {
            z,
            n,
            alpha: F::from_f64(params.alpha),
            beta: F::from_f64(params.beta),
            lambda1: F::from_f64(params.lambda1),
            lambda2: F::from_f64(params.lambda2),
        }
    }

    /// Number of label slots.
    #[inline]
    pub fn n_slots(&self) -> usize {
        self.z.nrows()
    }

    /// Hash-table width.
    #[inline]
    pub fn nbins(&self) -> usize {
        self.z.ncols()
    }

    /// Append one zero-initialized slot; existing slots are untouched.
    pub fn add_slot(&mut self) {
        let zeros = Array1::<F>::zeros(self.nbins());
        self.z
            .push_row(zeros.view())
            .expect("slot rows share the bin width");
        self.n
            .push_row(zeros.view())
            .expect("slot rows share the bin width");
    }

    /// Effective weight at `(slot, bin)`, derived from the accumulators.
    ///
    /// Zero inside the L1 soft-threshold band, otherwise the proximal
    /// closed form.
    #[inline]
    pub fn weight(&self, slot: usize, bin: usize) -> F {
        let z = self.z[[slot, bin]];
        if z.abs() <= self.lambda1 {
            return F::zero();
        }
        let n = self.n[[slot, bin]];
        -(z - z.signum() * self.lambda1)
            / ((self.beta + n.sqrt()) / self.alpha + self.lambda2)
    }

    /// Apply one FTRL-Proximal update for gradient `g` at `(slot, bin)`.
    ///
    /// `w` is the weight at this cell read during the row's prediction
    /// phase, before any of the row's updates.
    #[inline]
    pub fn update(&mut self, slot: usize, bin: usize, g: F, w: F) {
        let n = self.n[[slot, bin]];
        let g2 = g * g;
        let sigma = ((n + g2).sqrt() - n.sqrt()) / self.alpha;
        self.z[[slot, bin]] += g - sigma * w;
        self.n[[slot, bin]] += g2;
    }

    /// Raw `z` accumulators for one slot.
    pub fn z_row(&self, slot: usize) -> ndarray::ArrayView1<'_, F> {
        self.z.row(slot)
    }

    /// Raw `n` accumulators for one slot.
    pub fn n_row(&self, slot: usize) -> ndarray::ArrayView1<'_, F> {
        self.n.row(slot)
    }

    /// Flattened accumulators, slot-major (snapshot capture).
    pub(crate) fn to_parts(&self) -> (Vec<F>, Vec<F>) {
        (
            self.z.iter().copied().collect(),
            self.n.iter().copied().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(nbins: usize) -> FtrlParams {
        FtrlParams {
            nbins,
            ..Default::default()
        }
    }

    #[test]
    fn starts_at_zero() {
        let store = WeightStore::<f32>::new(&params(8), 1);
        assert_eq!(store.n_slots(), 1);
        assert_eq!(store.nbins(), 8);
        for bin in 0..8 {
            assert_eq!(store.weight(0, bin), 0.0);
        }
    }

    #[test]
    fn single_update_closed_form() {
        // Defaults: alpha 0.005, beta 1, lambda1 0, lambda2 1.
        // First update with g = -0.5 on a zero cell: w = 0, so
        // z = -0.5 and n = 0.25 exactly.
        let mut store = WeightStore::<f32>::new(&params(4), 1);
        let w = store.weight(0, 2);
        store.update(0, 2, -0.5, w);
        assert_eq!(store.z_row(0)[2], -0.5);
        assert_eq!(store.n_row(0)[2], 0.25);
        // Untouched cells stay zero.
        assert_eq!(store.z_row(0)[0], 0.0);
        assert_eq!(store.n_row(0)[0], 0.0);
    }

    #[test]
    fn weight_derivation_matches_formula() {
        let p = FtrlParams {
            alpha: 0.5,
            beta: 1.0,
            lambda1: 0.1,
            lambda2: 2.0,
            nbins: 2,
            ..Default::default()
        };
        let mut store = WeightStore::<f64>::new(&p, 1);
        let w0 = store.weight(0, 0);
        store.update(0, 0, -1.0, w0);
        // z = -1, n = 1 after the update.
        let expected = -(-1.0f64 - (-1.0f64).signum() * 0.1) / ((1.0 + 1.0f64.sqrt()) / 0.5 + 2.0);
        assert_relative_eq!(store.weight(0, 0), expected, max_relative = 1e-12);
    }

    #[test]
    fn l1_band_zeroes_weight() {
        let p = FtrlParams {
            lambda1: 1.0,
            nbins: 2,
            ..Default::default()
        };
        let mut store = WeightStore::<f64>::new(&p, 1);
        let w = store.weight(0, 0);
        store.update(0, 0, 0.5, w);
        // |z| = 0.5 <= lambda1 = 1.0
        assert_eq!(store.weight(0, 0), 0.0);
    }

    #[test]
    fn sigma_uses_pre_update_weight() {
        let mut store = WeightStore::<f64>::new(&params(2), 1);
        let w0 = store.weight(0, 0);
        store.update(0, 0, -0.5, w0);
        let w1 = store.weight(0, 0);
        assert!(w1 != 0.0);
        store.update(0, 0, 0.25, w1);
        // z = -0.5 + 0.25 - sigma * w1 with sigma from n: 0.25 -> 0.3125.
        let sigma = ((0.25f64 + 0.0625).sqrt() - 0.25f64.sqrt()) / 0.005;
        assert_relative_eq!(
            store.z_row(0)[0],
            -0.5 + 0.25 - sigma * w1,
            max_relative = 1e-12
        );
        assert_relative_eq!(store.n_row(0)[0], 0.3125, max_relative = 1e-12);
    }

    #[test]
    fn add_slot_preserves_existing() {
        let mut store = WeightStore::<f32>::new(&params(4), 1);
        let w = store.weight(0, 1);
        store.update(0, 1, -0.5, w);
        let z_before = store.z_row(0).to_vec();
        let n_before = store.n_row(0).to_vec();

        store.add_slot();
        assert_eq!(store.n_slots(), 2);
        assert_eq!(store.z_row(0).to_vec(), z_before);
        assert_eq!(store.n_row(0).to_vec(), n_before);
        assert!(store.z_row(1).iter().all(|&v| v == 0.0));
        assert!(store.n_row(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn parts_round_trip() {
        let p = params(3);
        let mut store = WeightStore::<f64>::new(&p, 2);
        let w = store.weight(1, 2);
        store.update(1, 2, 0.7, w);
        let (z, n) = store.to_parts();
        let z2 = Array2::from_shape_vec((2, 3), z).unwrap();
        let n2 = Array2::from_shape_vec((2, 3), n).unwrap();
        let restored = WeightStore::from_parts(&p, z2, n2);
        assert_eq!(store, restored);
    }
}
