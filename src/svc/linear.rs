//! Linear binary SVM with an explicit primal weight vector

use crate::core::{
    BinaryClassifier, BinaryModel, OptimizationResult, OptimizerConfig, Result, Sample,
    SparseVector,
};
use crate::kernel::LinearKernel;
use crate::solver::SMOSolver;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Untrained linear C-SVC
#[derive(Debug, Clone)]
pub struct LinearSvc {
    config: OptimizerConfig,
}

impl LinearSvc {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

impl BinaryClassifier for LinearSvc {
    type Model = LinearModel;

    fn fit(&self, samples: &[Sample], n_features: usize) -> Result<LinearModel> {
        debug!(
            "fitting linear SVC on {} samples (C={})",
            samples.len(),
            self.config.c
        );
        let solver = SMOSolver::new(Arc::new(LinearKernel::new()), self.config.clone());
        let result = solver.solve(samples)?;
        Ok(LinearModel::from_solution(samples, &result, n_features))
    }
}

/// Trained linear model: f(x) = w·x + b
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
    n_support: usize,
}

impl LinearModel {
    /// Collapse the dual solution into w = Σ αᵢyᵢxᵢ
    pub fn from_solution(
        samples: &[Sample],
        result: &OptimizationResult,
        n_features: usize,
    ) -> Self {
        let dim = samples
            .iter()
            .map(|s| s.features.dim())
            .fold(n_features, usize::max);
        let mut weights = vec![0.0; dim];

        for &i in &result.support_vectors {
            let coef = result.alpha[i] * samples[i].label;
            let features = &samples[i].features;
            for (&idx, &value) in features.indices.iter().zip(&features.values) {
                weights[idx] += coef * value;
            }
        }

        Self {
            weights,
            bias: result.b,
            n_support: result.support_vectors.len(),
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl BinaryModel for LinearModel {
    fn decision_function(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.bias
    }

    fn n_support_vectors(&self) -> usize {
        self.n_support
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
