//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function trait
///
/// Every binary sub-problem of a multi-class fit evaluates its kernel through
/// this trait, both inside the solver and when scoring new rows.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Compute K(x, y) given precomputed squared norms of both vectors
    ///
    /// Distance-based kernels override this; the rest ignore the norms.
    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }
}
