//! Kernel row cache
//!
//! The SMO solver reads whole kernel rows K(i, ·) for the two variables of
//! each working pair. Rows are kept in an LRU cache sized from a memory
//! budget, so long runs on small sub-problems never recompute a row.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// LRU cache of kernel matrix rows, keyed by training index
pub struct KernelCache {
    rows: LruCache<usize, Rc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` rows (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Size the cache from a byte budget for rows of `row_len` f64 values
    ///
    /// Two rows always fit, since every pair update reads two.
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = row_len.max(1) * std::mem::size_of::<f64>();
        Self::new((memory_bytes / row_bytes).max(2))
    }

    /// Fetch row `i`, computing it with `compute` on a miss
    pub fn get_or_compute<F>(&mut self, i: usize, compute: F) -> Rc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.rows.get(&i) {
            self.hits += 1;
            return Rc::clone(row);
        }

        self.misses += 1;
        let row: Rc<[f64]> = compute().into();
        self.rows.put(i, Rc::clone(&row));
        row
    }

    pub fn contains(&self, i: usize) -> bool {
        self.rows.contains(&i)
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }

    /// Drop all rows and reset counters
    pub fn clear(&mut self) {
        self.rows.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
