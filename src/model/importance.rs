//! Feature-importance accounting.
//!
//! One accumulator per declared base feature (training-view column order)
//! followed by one per interaction (declaration order). Each processed row
//! adds the absolute weight change it applied at the feature's bin, summed
//! across label slots; the exposed importance is the running mean over
//! processed rows, so features hit by every row stay comparable to features
//! hit rarely.

use super::scalar::Scalar;

/// Running importance accumulators, fixed in count and order at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceTracker<F> {
    names: Vec<String>,
    totals: Vec<F>,
    rows: u64,
}

impl<F: Scalar> ImportanceTracker<F> {
    /// Fresh tracker for the given feature and interaction names.
    pub fn new(names: Vec<String>) -> Self {
        let totals = vec![F::zero(); names.len()];
        Self {
            names,
            totals,
            rows: 0,
        }
    }

    /// Rebuild from persisted accumulators.
    pub(crate) fn from_parts(names: Vec<String>, totals: Vec<F>, rows: u64) -> Self {
        debug_assert_eq!(names.len(), totals.len());
        Self {
            names,
            totals,
            rows,
        }
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entry names in fixed declared order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Add one row's absolute weight change for entry `index`.
    #[inline]
    pub fn accumulate(&mut self, index: usize, delta: F) {
        self.totals[index] += delta;
    }

    /// Count one processed row. Skipped rows (missing target) do not count.
    #[inline]
    pub fn count_row(&mut self) {
        self.rows += 1;
    }

    /// Running mean importance for entry `index`.
    pub fn importance(&self, index: usize) -> F {
        if self.rows == 0 {
            F::zero()
        } else {
            self.totals[index] / F::from_f64(self.rows as f64)
        }
    }

    /// Owned `(name, importance)` snapshot, independent of the live model.
    pub fn snapshot(&self) -> Vec<(String, F)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), self.importance(i)))
            .collect()
    }

    /// Raw accumulators for persistence.
    pub(crate) fn to_parts(&self) -> (Vec<String>, Vec<F>, u64) {
        (self.names.clone(), self.totals.clone(), self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn running_mean_over_rows() {
        let mut tracker = ImportanceTracker::<f64>::new(vec!["a".into(), "b".into()]);
        tracker.accumulate(0, 0.5);
        tracker.accumulate(1, 0.1);
        tracker.count_row();
        tracker.accumulate(0, 0.1);
        tracker.accumulate(1, 0.1);
        tracker.count_row();

        assert_relative_eq!(tracker.importance(0), 0.3);
        assert_relative_eq!(tracker.importance(1), 0.1);
    }

    #[test]
    fn zero_rows_means_zero_importance() {
        let tracker = ImportanceTracker::<f32>::new(vec!["a".into()]);
        assert_eq!(tracker.importance(0), 0.0);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut tracker = ImportanceTracker::<f64>::new(vec!["a".into()]);
        tracker.accumulate(0, 1.0);
        tracker.count_row();
        let snap = tracker.snapshot();
        tracker.accumulate(0, 9.0);
        tracker.count_row();
        assert_eq!(snap, vec![("a".to_string(), 1.0)]);
    }

    #[test]
    fn parts_round_trip() {
        let mut tracker = ImportanceTracker::<f32>::new(vec!["a".into(), "a:b".into()]);
        tracker.accumulate(1, 2.0);
        tracker.count_row();
        let (names, totals, rows) = tracker.to_parts();
        let restored = ImportanceTracker::from_parts(names, totals, rows);
        assert_eq!(tracker, restored);
    }
}
