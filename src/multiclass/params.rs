//! Hyperparameters and the binary classifier factories built from them

use crate::core::{BinaryClassifier, OptimizerConfig, Result, SVMError};
use crate::kernel::{Gamma, KernelSpec};
use crate::svc::{KernelSettings, KernelSvc, LinearSvc, NuSvc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trained model type produced by a factory's classifiers
pub type ModelOf<F> =
    <<F as BinaryClassifierFactory>::Classifier as BinaryClassifier>::Model;

/// Produces one freshly configured, untrained binary classifier per request
///
/// Every call yields an identically configured instance; no state is shared
/// between instances. Invalid hyperparameters are reported here.
pub trait BinaryClassifierFactory: Send + Sync {
    type Classifier: BinaryClassifier;

    /// Which binary formulation this factory produces
    const KIND: SvcKind;

    fn build(&self) -> Result<Self::Classifier>;
}

/// Binary classifier formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SvcKind {
    Linear,
    Kernel,
    Nu,
}

impl SvcKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SvcKind::Linear => "linear",
            SvcKind::Kernel => "kernel",
            SvcKind::Nu => "nu",
        }
    }
}

impl fmt::Display for SvcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SvcKind {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(SvcKind::Linear),
            "kernel" => Ok(SvcKind::Kernel),
            "nu" => Ok(SvcKind::Nu),
            other => Err(SVMError::InvalidParameter(format!(
                "unknown classifier kind {other:?} (expected linear, kernel or nu)"
            ))),
        }
    }
}

fn solver_config(c: f64, tol: f64, max_iter: usize, verbose: bool) -> Result<OptimizerConfig> {
    if !(c.is_finite() && c > 0.0) {
        return Err(SVMError::InvalidParameter(format!(
            "C must be positive, got: {c}"
        )));
    }
    if !(tol.is_finite() && tol > 0.0) {
        return Err(SVMError::InvalidParameter(format!(
            "tol must be positive, got: {tol}"
        )));
    }
    if max_iter == 0 {
        return Err(SVMError::InvalidParameter(
            "max_iter must be at least 1".to_string(),
        ));
    }

    Ok(OptimizerConfig {
        c,
        epsilon: tol,
        max_iterations: max_iter,
        verbose,
        ..OptimizerConfig::default()
    })
}

fn kernel_settings(kernel: &str, gamma: Gamma, degree: u32, coef0: f64) -> Result<KernelSettings> {
    let spec: KernelSpec = kernel.parse()?;
    gamma.validate()?;
    if !coef0.is_finite() {
        return Err(SVMError::InvalidParameter(format!(
            "coef0 must be finite, got: {coef0}"
        )));
    }
    Ok(KernelSettings {
        spec,
        gamma,
        degree,
        coef0,
    })
}

/// Hyperparameters of the linear classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub verbose: bool,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-3,
            verbose: false,
        }
    }
}

impl LinearParams {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl BinaryClassifierFactory for LinearParams {
    type Classifier = LinearSvc;
    const KIND: SvcKind = SvcKind::Linear;

    fn build(&self) -> Result<LinearSvc> {
        let config = solver_config(self.c, self.tol, self.max_iter, self.verbose)?;
        Ok(LinearSvc::new(config))
    }
}

/// Hyperparameters of the kernel C-SVC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelParams {
    pub c: f64,
    pub max_iter: usize,
    pub kernel: String,
    pub degree: u32,
    pub gamma: Gamma,
    pub coef0: f64,
    pub tol: f64,
    pub verbose: bool,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            kernel: "rbf".to_string(),
            degree: 3,
            gamma: Gamma::Scale,
            coef0: 0.0,
            tol: 1e-3,
            verbose: false,
        }
    }
}

impl KernelParams {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Kernel name; checked when the estimator is fitted
    pub fn with_kernel(mut self, kernel: &str) -> Self {
        self.kernel = kernel.to_string();
        self
    }

    pub fn with_degree(mut self, degree: u32) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.coef0 = coef0;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl BinaryClassifierFactory for KernelParams {
    type Classifier = KernelSvc;
    const KIND: SvcKind = SvcKind::Kernel;

    fn build(&self) -> Result<KernelSvc> {
        let config = solver_config(self.c, self.tol, self.max_iter, self.verbose)?;
        let kernel = kernel_settings(&self.kernel, self.gamma, self.degree, self.coef0)?;
        Ok(KernelSvc::new(kernel, config))
    }
}

/// Hyperparameters of the ν-SVC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuParams {
    pub nu: f64,
    pub max_iter: usize,
    pub kernel: String,
    pub degree: u32,
    pub gamma: Gamma,
    pub coef0: f64,
    pub tol: f64,
    pub verbose: bool,
}

impl Default for NuParams {
    fn default() -> Self {
        Self {
            nu: 0.5,
            max_iter: 1000,
            kernel: "rbf".to_string(),
            degree: 3,
            gamma: Gamma::Scale,
            coef0: 0.0,
            tol: 1e-3,
            verbose: false,
        }
    }
}

impl NuParams {
    pub fn with_nu(mut self, nu: f64) -> Self {
        self.nu = nu;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_kernel(mut self, kernel: &str) -> Self {
        self.kernel = kernel.to_string();
        self
    }

    pub fn with_degree(mut self, degree: u32) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.coef0 = coef0;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl BinaryClassifierFactory for NuParams {
    type Classifier = NuSvc;
    const KIND: SvcKind = SvcKind::Nu;

    fn build(&self) -> Result<NuSvc> {
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(SVMError::InvalidParameter(format!(
                "nu must be in (0, 1], got: {}",
                self.nu
            )));
        }
        // C is not part of the ν formulation; the solver's box is [0, 1]
        let config = solver_config(1.0, self.tol, self.max_iter, self.verbose)?;
        let kernel = kernel_settings(&self.kernel, self.gamma, self.degree, self.coef0)?;
        Ok(NuSvc::new(self.nu, kernel, config))
    }
}
