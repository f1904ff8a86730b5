//! Sigmoid (Tanh) Kernel Implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The kernel is not positive semi-definite for every (γ, r); the solver
//! guards against non-positive curvature when it meets such pairs.

use crate::core::SparseVector;
use crate::kernel::traits::Kernel;
use serde::{Deserialize, Serialize};

/// Sigmoid (Hyperbolic Tangent) kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmoidKernel {
    /// Scaling parameter for the dot product (must be positive)
    pub gamma: f64,
    /// Bias/offset parameter
    pub coef0: f64,
}

impl SigmoidKernel {
    /// Creates a new Sigmoid kernel
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64, coef0: f64) -> Self {
        if gamma <= 0.0 {
            panic!("Gamma must be positive, got: {}", gamma);
        }
        Self { gamma, coef0 }
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * x.dot(y) + self.coef0).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sigmoid_kernel_values() {
        let kernel = SigmoidKernel::new(0.5, -1.0);
        let x = SparseVector::new(vec![0, 1], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![0, 1], vec![2.0, 2.0]);

        // tanh(0.5 * 4 - 1) = tanh(1)
        assert_relative_eq!(kernel.compute(&x, &y), 1.0f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn test_sigmoid_kernel_bounded() {
        let kernel = SigmoidKernel::new(10.0, 0.0);
        let x = SparseVector::new(vec![0], vec![100.0]);

        let value = kernel.compute(&x, &x);
        assert!(value <= 1.0 && value >= -1.0);
    }

    #[test]
    #[should_panic(expected = "Gamma must be positive")]
    fn test_sigmoid_invalid_gamma() {
        SigmoidKernel::new(-1.0, 0.0);
    }
}
