//! Worker pool configuration for independent sub-classifier work
//!
//! Binary sub-problems of a decomposition never share mutable state, so they
//! are mapped over a `rayon` pool and collected in submission order.

use crate::core::{Result, SVMError};
use rayon::prelude::*;
use std::num::NonZeroUsize;

/// Whether parallel execution is allowed.
///
/// Components receive this flag and only decide between sequential and
/// `rayon` iteration; the pool itself is installed by [`run_with_workers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map `f` over `iter`, keeping results in input order
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

/// Worker pool size derived from an `n_jobs` hint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workers {
    Sequential,
    /// Dedicated pool with exactly this many threads (always more than one)
    Limit(NonZeroUsize),
    /// Global pool, all available cores
    All,
}

impl Workers {
    /// Interpret `n_jobs`:
    ///
    /// - `None` or `1`: sequential
    /// - `n > 1`: exactly `n` threads
    /// - `-1`: all cores
    /// - `-k`: all cores but `k - 1`, at least one
    /// - `0`: rejected
    pub fn from_n_jobs(n_jobs: Option<i32>) -> Result<Self> {
        let Some(n_jobs) = n_jobs else {
            return Ok(Workers::Sequential);
        };

        let threads = match n_jobs {
            0 => {
                return Err(SVMError::InvalidParameter(
                    "n_jobs must be a non-zero integer".to_string(),
                ))
            }
            -1 => return Ok(Workers::All),
            n if n > 0 => n as i64,
            n => available_cores() as i64 + 1 + n as i64,
        };

        Ok(match usize::try_from(threads).ok().and_then(NonZeroUsize::new) {
            Some(n) if n.get() > 1 => Workers::Limit(n),
            _ => Workers::Sequential,
        })
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Run `f` with the pool selected by `workers`
pub fn run_with_workers<T: Send>(
    workers: Workers,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T> {
    match workers {
        Workers::Sequential => Ok(f(Parallelism::Sequential)),
        Workers::All if rayon::current_num_threads() > 1 => Ok(f(Parallelism::Parallel)),
        Workers::All => Ok(f(Parallelism::Sequential)),
        Workers::Limit(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n.get())
                .build()
                .map_err(|e| {
                    SVMError::InvalidParameter(format!("failed to build worker pool: {e}"))
                })?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    #[test]
    fn test_workers_from_n_jobs() {
        assert_eq!(Workers::from_n_jobs(None).unwrap(), Workers::Sequential);
        assert_eq!(Workers::from_n_jobs(Some(1)).unwrap(), Workers::Sequential);
        assert_eq!(
            Workers::from_n_jobs(Some(3)).unwrap(),
            Workers::Limit(NonZeroUsize::new(3).unwrap())
        );
        assert_eq!(Workers::from_n_jobs(Some(-1)).unwrap(), Workers::All);

        // Far more excluded cores than exist still leaves one worker
        assert_eq!(
            Workers::from_n_jobs(Some(-10_000)).unwrap(),
            Workers::Sequential
        );
    }

    #[test]
    fn test_workers_negative_counts_from_cores() {
        let cores = available_cores();
        let expected = match cores.saturating_sub(1) {
            n if n > 1 => Workers::Limit(NonZeroUsize::new(n).unwrap()),
            _ => Workers::Sequential,
        };
        assert_eq!(Workers::from_n_jobs(Some(-2)).unwrap(), expected);
    }

    #[test]
    fn test_zero_n_jobs_rejected() {
        let err = Workers::from_n_jobs(Some(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_maybe_par_map_preserves_order() {
        let items: Vec<usize> = (0..100).collect();

        let sequential = Parallelism::Sequential.maybe_par_map(items.clone(), |x| x * 2);
        let parallel = Parallelism::Parallel.maybe_par_map(items, |x| x * 2);

        assert_eq!(sequential, parallel);
        assert_eq!(parallel[99], 198);
    }

    #[test]
    fn test_run_with_limited_pool() {
        let workers = Workers::Limit(NonZeroUsize::new(2).unwrap());

        let (parallelism, threads) =
            run_with_workers(workers, |p| (p, rayon::current_num_threads())).unwrap();

        assert_eq!(parallelism, Parallelism::Parallel);
        assert_eq!(threads, 2);
    }

    #[test]
    fn test_run_sequential() {
        let result = run_with_workers(Workers::Sequential, |p| p).unwrap();
        assert_eq!(result, Parallelism::Sequential);
    }
}
