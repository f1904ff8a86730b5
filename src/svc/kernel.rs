//! Kernelized binary SVMs: the C formulation and the ν formulation
//!
//! Both keep their support vectors and evaluate
//! `f(x) = Σ coefᵢ K(svᵢ, x) + b` with `coefᵢ = αᵢyᵢ`.

use crate::core::{
    BinaryClassifier, BinaryModel, OptimizationResult, OptimizerConfig, Result, Sample,
    SparseVector,
};
use crate::kernel::{Gamma, Kernel, KernelFunction, KernelSpec};
use crate::solver::SMOSolver;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kernel hyperparameters before gamma is resolved against training data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelSettings {
    pub spec: KernelSpec,
    pub gamma: Gamma,
    pub degree: u32,
    pub coef0: f64,
}

impl KernelSettings {
    pub fn resolve(&self, samples: &[Sample], n_features: usize) -> KernelFunction {
        let gamma = if self.spec.uses_gamma() {
            self.gamma.resolve(samples, n_features)
        } else {
            1.0
        };
        self.spec.resolve(gamma, self.degree, self.coef0)
    }
}

/// Untrained kernel C-SVC
#[derive(Debug, Clone)]
pub struct KernelSvc {
    kernel: KernelSettings,
    config: OptimizerConfig,
}

impl KernelSvc {
    pub fn new(kernel: KernelSettings, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }
}

impl BinaryClassifier for KernelSvc {
    type Model = KernelModel;

    fn fit(&self, samples: &[Sample], n_features: usize) -> Result<KernelModel> {
        let kernel = self.kernel.resolve(samples, n_features);
        debug!(
            "fitting {} C-SVC on {} samples (C={}, kernel={:?})",
            kernel.name(),
            samples.len(),
            self.config.c,
            kernel
        );
        let solver = SMOSolver::new(Arc::new(kernel.clone()), self.config.clone());
        let result = solver.solve(samples)?;
        Ok(KernelModel::from_solution(kernel, samples, &result))
    }
}

/// Untrained ν-SVC
#[derive(Debug, Clone)]
pub struct NuSvc {
    nu: f64,
    kernel: KernelSettings,
    config: OptimizerConfig,
}

impl NuSvc {
    pub fn new(nu: f64, kernel: KernelSettings, config: OptimizerConfig) -> Self {
        Self { nu, kernel, config }
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }
}

impl BinaryClassifier for NuSvc {
    type Model = KernelModel;

    fn fit(&self, samples: &[Sample], n_features: usize) -> Result<KernelModel> {
        let kernel = self.kernel.resolve(samples, n_features);
        debug!(
            "fitting {} nu-SVC on {} samples (nu={}, kernel={:?})",
            kernel.name(),
            samples.len(),
            self.nu,
            kernel
        );
        let solver = SMOSolver::new(Arc::new(kernel.clone()), self.config.clone());
        let result = solver.solve_nu(samples, self.nu)?;
        Ok(KernelModel::from_solution(kernel, samples, &result))
    }
}

/// Trained kernel model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelModel {
    kernel: KernelFunction,
    support_vectors: Vec<SparseVector>,
    dual_coef: Vec<f64>,
    bias: f64,
}

impl KernelModel {
    pub fn from_solution(
        kernel: KernelFunction,
        samples: &[Sample],
        result: &OptimizationResult,
    ) -> Self {
        let (support_vectors, dual_coef) = result
            .support_vectors
            .iter()
            .map(|&i| {
                (
                    samples[i].features.clone(),
                    result.alpha[i] * samples[i].label,
                )
            })
            .unzip();

        Self {
            kernel,
            support_vectors,
            dual_coef,
            bias: result.b,
        }
    }

    pub fn kernel(&self) -> &KernelFunction {
        &self.kernel
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.support_vectors
    }

    /// αᵢyᵢ for each support vector
    pub fn dual_coef(&self) -> &[f64] {
        &self.dual_coef
    }
}

impl BinaryModel for KernelModel {
    fn decision_function(&self, x: &SparseVector) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel.compute(sv, x))
            .sum::<f64>()
            + self.bias
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
