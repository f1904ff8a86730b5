//! Kernel selection by name and gamma resolution
//!
//! Hyperparameters name a kernel ("linear", "rbf", "poly", "sigmoid") and a
//! gamma policy ("scale", "auto" or a number). Both are turned into a concrete
//! [`KernelFunction`] when a binary classifier is fitted, because the "scale"
//! and "auto" policies depend on the sub-problem's training rows.

use crate::core::{Result, SVMError, Sample, SparseVector};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel family selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelSpec {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl KernelSpec {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelSpec::Linear => "linear",
            KernelSpec::Rbf => "rbf",
            KernelSpec::Poly => "poly",
            KernelSpec::Sigmoid => "sigmoid",
        }
    }

    /// Whether the kernel reads the gamma hyperparameter
    pub fn uses_gamma(&self) -> bool {
        !matches!(self, KernelSpec::Linear)
    }

    /// Build the concrete kernel; `gamma` must already be positive
    pub fn resolve(&self, gamma: f64, degree: u32, coef0: f64) -> KernelFunction {
        match self {
            KernelSpec::Linear => KernelFunction::Linear,
            KernelSpec::Rbf => KernelFunction::Rbf(RBFKernel::new(gamma)),
            KernelSpec::Poly => KernelFunction::Poly(PolynomialKernel::new(degree, gamma, coef0)),
            KernelSpec::Sigmoid => KernelFunction::Sigmoid(SigmoidKernel::new(gamma, coef0)),
        }
    }
}

impl FromStr for KernelSpec {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "linear" => Ok(KernelSpec::Linear),
            "rbf" => Ok(KernelSpec::Rbf),
            "poly" => Ok(KernelSpec::Poly),
            "sigmoid" => Ok(KernelSpec::Sigmoid),
            other => Err(SVMError::UnknownKernel(other.to_string())),
        }
    }
}

impl fmt::Display for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gamma policy for rbf, poly and sigmoid kernels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gamma {
    /// 1 / (n_features * Var(X))
    #[default]
    Scale,
    /// 1 / n_features
    Auto,
    /// Fixed positive value
    Value(f64),
}

impl Gamma {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Gamma::Value(g) if !(g.is_finite() && g > 0.0) => Err(SVMError::InvalidParameter(
                format!("gamma must be positive and finite, got: {g}"),
            )),
            _ => Ok(()),
        }
    }

    /// Concrete gamma for a training subset of a matrix `n_features` wide
    ///
    /// Variance is taken over every entry of the dense n × `n_features`
    /// matrix, zeros included. Degenerate inputs (no features, zero variance)
    /// give 1.0.
    pub fn resolve(&self, samples: &[Sample], n_features: usize) -> f64 {
        let n_features = samples
            .iter()
            .map(|s| s.features.dim())
            .fold(n_features, usize::max);

        match *self {
            Gamma::Value(g) => g,
            Gamma::Auto if n_features > 0 => 1.0 / n_features as f64,
            Gamma::Auto => 1.0,
            Gamma::Scale => {
                let total = (samples.len() * n_features) as f64;
                if total == 0.0 {
                    return 1.0;
                }
                let (sum, sum_sq) = samples
                    .iter()
                    .flat_map(|s| s.features.values.iter())
                    .fold((0.0, 0.0), |(s, sq), &v| (s + v, sq + v * v));
                let mean = sum / total;
                let variance = sum_sq / total - mean * mean;
                if variance > 0.0 {
                    1.0 / (n_features as f64 * variance)
                } else {
                    1.0
                }
            }
        }
    }
}

impl FromStr for Gamma {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        let gamma = match s.trim() {
            "scale" => Gamma::Scale,
            "auto" => Gamma::Auto,
            other => other.parse::<f64>().map(Gamma::Value).map_err(|_| {
                SVMError::InvalidParameter(format!(
                    "gamma must be \"scale\", \"auto\" or a number, got: {other:?}"
                ))
            })?,
        };
        gamma.validate()?;
        Ok(gamma)
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => f.write_str("scale"),
            Gamma::Auto => f.write_str("auto"),
            Gamma::Value(g) => write!(f, "{g}"),
        }
    }
}

/// A fully resolved kernel, stored inside trained models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelFunction {
    Linear,
    Rbf(RBFKernel),
    Poly(PolynomialKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelFunction {
    pub fn name(&self) -> &'static str {
        match self {
            KernelFunction::Linear => "linear",
            KernelFunction::Rbf(_) => "rbf",
            KernelFunction::Poly(_) => "poly",
            KernelFunction::Sigmoid(_) => "sigmoid",
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match self {
            KernelFunction::Linear => LinearKernel.compute(x, y),
            KernelFunction::Rbf(k) => k.compute(x, y),
            KernelFunction::Poly(k) => k.compute(x, y),
            KernelFunction::Sigmoid(k) => k.compute(x, y),
        }
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match self {
            KernelFunction::Rbf(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
            other => other.compute(x, y),
        }
    }
}
