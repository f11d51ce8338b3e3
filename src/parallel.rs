//! Parallelism configuration for sub-row fan-out.
//!
//! Row-steps are strictly sequential during training (each update must
//! observe the previous row's mutations), so parallel execution is confined
//! to weight-independent work: per-row hashing and read-only scoring.
//!
//! The actual thread pool is ambient (rayon's global pool or whatever pool
//! the caller installed); components only receive this flag.

use rayon::prelude::*;

/// Whether parallel execution is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Bridge an ordinary iterator into a parallel for_each when allowed.
    ///
    /// Used for iterators that don't implement `IntoParallelIterator`,
    /// like `axis_iter_mut` over a bin or score matrix.
    #[inline]
    pub fn maybe_par_bridge_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: Iterator<Item = T> + Send,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.par_bridge().for_each(f);
        } else {
            iter.for_each(f);
        }
    }

    /// Parallel bridge for_each with per-thread initialization.
    ///
    /// The `init` closure runs once per worker thread (parallel mode) or
    /// once total (sequential mode); ideal for thread-local scratch buffers.
    #[inline]
    pub fn maybe_par_bridge_for_each_init<T, I, INIT, S, F>(self, iter: I, init: INIT, f: F)
    where
        T: Send,
        I: Iterator<Item = T> + Send,
        INIT: Fn() -> S + Sync + Send,
        F: Fn(&mut S, T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.par_bridge().for_each_init(init, f);
        } else {
            let mut state = init();
            iter.for_each(|item| f(&mut state, item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn from_threads_semantics() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(2).is_parallel());
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn bridge_for_each_both_modes() {
        let sum = AtomicUsize::new(0);
        Parallelism::Sequential.maybe_par_bridge_for_each(0..10usize, |i| {
            sum.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 45);

        sum.store(0, Ordering::Relaxed);
        Parallelism::Parallel.maybe_par_bridge_for_each(0..10usize, |i| {
            sum.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 45);
    }

    #[test]
    fn bridge_for_each_init_reuses_state() {
        let sum = AtomicUsize::new(0);
        Parallelism::Sequential.maybe_par_bridge_for_each_init(
            0..5usize,
            Vec::<usize>::new,
            |scratch, i| {
                scratch.push(i);
                sum.fetch_add(i, Ordering::Relaxed);
            },
        );
        assert_eq!(sum.load(Ordering::Relaxed), 10);
    }
}
