//! Feature hashing: column identities, per-row feature hashes, bin indices.
//!
//! Every training column gets a stable 64-bit identity hash derived from its
//! name (MurmurHash2-64A, seed 0). Per row, each column's typed value is
//! reduced to a 64-bit representation and combined with the column identity
//! into a feature hash; interactions combine their members' feature hashes
//! with an order-sensitive fold. The final bin index is the unsigned
//! remainder `hash % nbins`.
//!
//! Column identity hashes are part of the persisted model state and must
//! reproduce bit-for-bit across process restarts for the same column names.

use ndarray::{Array2, Axis};

use crate::data::{DataView, Value};
use crate::parallel::Parallelism;

/// Sentinel representation for a missing value.
///
/// Combined with the column identity hash, so missing values in different
/// columns land in different bins.
pub const MISSING_VALUE_HASH: u64 = 0x9e37_79b9_7f4a_7c15;

const MURMUR_M: u64 = 0xc6a4_a793_5bd1_e995;
const MURMUR_R: u32 = 47;

/// MurmurHash2, 64-bit variant A.
///
/// In-crate implementation; the identity-hash sequence of a trained model is
/// persisted state, so the function can never silently change behind a
/// dependency upgrade.
pub fn murmur2(bytes: &[u8], seed: u64) -> u64 {
    let len = bytes.len();
    let mut h: u64 = seed ^ (len as u64).wrapping_mul(MURMUR_M);

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut k = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        k = k.wrapping_mul(MURMUR_M);
        k ^= k >> MURMUR_R;
        k = k.wrapping_mul(MURMUR_M);
        h ^= k;
        h = h.wrapping_mul(MURMUR_M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k: u64 = 0;
        for (i, &b) in tail.iter().enumerate() {
            k |= (b as u64) << (8 * i);
        }
        h ^= k;
        h = h.wrapping_mul(MURMUR_M);
    }

    h ^= h >> MURMUR_R;
    h = h.wrapping_mul(MURMUR_M);
    h ^= h >> MURMUR_R;
    h
}

/// Identity hash of a column name.
#[inline]
pub fn column_hash(name: &str) -> u64 {
    murmur2(name.as_bytes(), 0)
}

/// Identity hashes for every column of a view, in column order.
pub fn column_hashes(view: &dyn DataView) -> Vec<u64> {
    (0..view.n_cols())
        .map(|c| column_hash(view.col_name(c)))
        .collect()
}

/// 64-bit representation of a typed value.
///
/// Booleans and integers map through their two's-complement bits, floats
/// through their IEEE-754 bit pattern, strings through murmur2 of their
/// UTF-8 bytes, and missing values through the fixed sentinel.
#[inline]
fn value_hash(value: Value<'_>) -> u64 {
    match value {
        Value::Bool(b) => b as u64,
        Value::Int(i) => i as u64,
        Value::Float(x) => x.to_bits(),
        Value::Str(s) => murmur2(s.as_bytes(), 0),
        Value::Missing => MISSING_VALUE_HASH,
    }
}

/// Combined feature hash of one cell.
#[inline]
pub fn feature_hash(col_hash: u64, value: Value<'_>) -> u64 {
    col_hash.wrapping_add(value_hash(value))
}

/// Order-sensitive combination of member feature hashes for one interaction.
///
/// Operates on the members' feature hashes (not their bin indices), so two
/// interactions over the same group in different member order hash apart.
#[inline]
pub fn interaction_hash(member_hashes: impl IntoIterator<Item = u64>) -> u64 {
    let mut h: u64 = MURMUR_M;
    for fh in member_hashes {
        h = (h ^ fh).wrapping_mul(MURMUR_M);
        h ^= h >> MURMUR_R;
    }
    h
}

/// Hashes the rows of a view into bin indices.
///
/// One bin per base column followed by one per interaction group, matching
/// the weight-store active-bin layout and the importance-entry order.
pub struct RowHasher<'a> {
    col_hashes: &'a [u64],
    /// Interaction groups resolved to column indices.
    groups: &'a [Vec<usize>],
    nbins: u64,
}

impl<'a> RowHasher<'a> {
    pub fn new(col_hashes: &'a [u64], groups: &'a [Vec<usize>], nbins: usize) -> Self {
        Self {
            col_hashes,
            groups,
            nbins: nbins as u64,
        }
    }

    /// Number of active bins per row: base columns plus interactions.
    pub fn n_active(&self) -> usize {
        self.col_hashes.len() + self.groups.len()
    }

    /// Fill `bins` with the row's bin indices.
    ///
    /// `feature_hashes` is caller-provided scratch of length `n_cols`,
    /// reused across rows.
    pub fn fill_row(
        &self,
        view: &dyn DataView,
        row: usize,
        feature_hashes: &mut [u64],
        bins: &mut [u64],
    ) {
        debug_assert_eq!(feature_hashes.len(), self.col_hashes.len());
        debug_assert_eq!(bins.len(), self.n_active());

        for (col, &ch) in self.col_hashes.iter().enumerate() {
            let fh = feature_hash(ch, view.value(row, col));
            feature_hashes[col] = fh;
            bins[col] = fh % self.nbins;
        }
        let n_cols = self.col_hashes.len();
        for (g, group) in self.groups.iter().enumerate() {
            let h = interaction_hash(group.iter().map(|&c| feature_hashes[c]));
            bins[n_cols + g] = h % self.nbins;
        }
    }

    /// Precompute the bin matrix `[n_rows, n_active]` for a whole view.
    ///
    /// Hashing depends only on the input values, never on the weights, so
    /// rows fan out freely; row-step ordering constraints apply only to
    /// weight updates.
    pub fn compute_bins(&self, view: &dyn DataView, parallelism: Parallelism) -> Array2<u64> {
        let n_rows = view.n_rows();
        let mut bins = Array2::<u64>::zeros((n_rows, self.n_active()));
        let n_cols = self.col_hashes.len();

        parallelism.maybe_par_bridge_for_each_init(
            bins.axis_iter_mut(Axis(0)).enumerate(),
            || vec![0u64; n_cols],
            |scratch, (row, mut out)| {
                self.fill_row(
                    view,
                    row,
                    scratch,
                    out.as_slice_mut().expect("bin rows are contiguous"),
                );
            },
        );
        bins
    }
}
