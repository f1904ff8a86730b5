//! Sequential Minimal Optimization (SMO) solver
//!
//! Solves the binary SVM dual
//!
//! ```text
//! min ½ αᵀQα + pᵀα   s.t.  yᵀα = const,  0 ≤ αᵢ ≤ U
//! ```
//!
//! with `Qᵢⱼ = yᵢyⱼK(xᵢ, xⱼ)`, using second-order working set selection.
//! Two formulations share the pair update:
//!
//! - C-SVC: `p = -1`, `U = C`, starting from α = 0
//! - ν-SVC: `p = 0`, `U = 1`, with `Σαᵢ = ν·n` split evenly across both
//!   classes; pairs are always chosen within one class, and the result is
//!   rescaled so the margin sits at ±1

use crate::cache::KernelCache;
use crate::core::{OptimizationResult, OptimizerConfig, Result, SVMError, Sample};
use crate::kernel::Kernel;
use log::{log, warn, Level};
use std::rc::Rc;
use std::sync::Arc;

/// Floor for the curvature of a working pair
const TAU: f64 = 1e-12;

/// SMO solver for SVM optimization
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Solve the C-SVC dual; returned alphas lie in [0, C]
    pub fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        validate_samples(samples)?;
        let c = self.config.c;
        if !(c.is_finite() && c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got: {c}"
            )));
        }

        let n = samples.len();
        let mut dual = DualProblem::new(
            self.kernel.as_ref(),
            samples,
            self.config.cache_size,
            vec![0.0; n],
            vec![-1.0; n],
            c,
        )?;

        let (iterations, converged) = self.optimize(&mut dual, Formulation::C)?;
        let objective_value = dual.objective();
        let b = -dual.rho_c();

        self.finish(dual.alpha, b, iterations, converged, objective_value)
    }

    /// Solve the ν-SVC dual; returned alphas are already rescaled by 1/r
    pub fn solve_nu(&self, samples: &[Sample], nu: f64) -> Result<OptimizationResult> {
        validate_samples(samples)?;
        if !(nu > 0.0 && nu <= 1.0) {
            return Err(SVMError::InvalidParameter(format!(
                "nu must be in (0, 1], got: {nu}"
            )));
        }

        let n = samples.len();
        let n_pos = samples.iter().filter(|s| s.label > 0.0).count();
        let n_neg = n - n_pos;
        if nu * n as f64 / 2.0 > n_pos.min(n_neg) as f64 {
            return Err(SVMError::OptimizationError(format!(
                "nu={nu} is infeasible for {n_pos} positive and {n_neg} negative samples"
            )));
        }

        // Spread ν·n/2 of mass over each class, filling boxes in order
        let mut remaining_pos = nu * n as f64 / 2.0;
        let mut remaining_neg = remaining_pos;
        let alpha = samples
            .iter()
            .map(|s| {
                let remaining = if s.label > 0.0 {
                    &mut remaining_pos
                } else {
                    &mut remaining_neg
                };
                let a = remaining.min(1.0);
                *remaining -= a;
                a
            })
            .collect();

        let mut dual = DualProblem::new(
            self.kernel.as_ref(),
            samples,
            self.config.cache_size,
            alpha,
            vec![0.0; n],
            1.0,
        )?;

        let (iterations, converged) = self.optimize(&mut dual, Formulation::Nu)?;
        let objective_value = dual.objective();
        let (rho, r) = dual.rho_nu();
        if !(r.is_finite() && r > 0.0) {
            return Err(SVMError::OptimizationError(format!(
                "nu-SVC margin scale is degenerate (r = {r})"
            )));
        }

        let alpha = dual.alpha.iter().map(|a| a / r).collect();
        self.finish(alpha, -rho / r, iterations, converged, objective_value)
    }

    fn optimize(&self, dual: &mut DualProblem<'_, K>, formulation: Formulation) -> Result<(usize, bool)> {
        let eps = self.config.epsilon;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let Some((i, j)) = dual.select_pair(formulation, eps) else {
                return Ok((iterations, true));
            };
            dual.update_pair(i, j)?;
            iterations += 1;
        }

        let converged = dual.select_pair(formulation, eps).is_none();
        Ok((iterations, converged))
    }

    fn finish(
        &self,
        alpha: Vec<f64>,
        b: f64,
        iterations: usize,
        converged: bool,
        objective_value: f64,
    ) -> Result<OptimizationResult> {
        if !b.is_finite() || alpha.iter().any(|a| !a.is_finite()) {
            return Err(SVMError::OptimizationError(
                "solver produced non-finite coefficients".to_string(),
            ));
        }

        if !converged {
            warn!(
                "SMO stopped at max_iter={} before reaching tol={}; the model may be suboptimal",
                self.config.max_iterations, self.config.epsilon
            );
        }

        let support_vectors: Vec<usize> = alpha
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 0.0)
            .map(|(i, _)| i)
            .collect();

        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log!(
            level,
            "SMO finished after {} iterations: {} support vectors, objective {:.6}, bias {:.6}",
            iterations,
            support_vectors.len(),
            objective_value,
            b
        );

        Ok(OptimizationResult {
            alpha,
            b,
            support_vectors,
            iterations,
            objective_value,
        })
    }
}

fn validate_samples(samples: &[Sample]) -> Result<()> {
    if samples.is_empty() {
        return Err(SVMError::EmptyDataset);
    }

    for sample in samples {
        if sample.label != 1.0 && sample.label != -1.0 {
            return Err(SVMError::InvalidLabel(sample.label));
        }
    }

    let has_pos = samples.iter().any(|s| s.label > 0.0);
    let has_neg = samples.iter().any(|s| s.label < 0.0);
    if !(has_pos && has_neg) {
        return Err(SVMError::InvalidDataset(
            "binary training data must contain both +1 and -1 samples".to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Formulation {
    C,
    Nu,
}

/// Kernel rows K(i, ·) backed by the LRU cache
struct KernelRows<'a, K: Kernel> {
    kernel: &'a K,
    samples: &'a [Sample],
    norms: Vec<f64>,
    cache: KernelCache,
}

impl<K: Kernel> KernelRows<'_, K> {
    fn row(&mut self, i: usize) -> Rc<[f64]> {
        let (kernel, samples, norms) = (self.kernel, self.samples, &self.norms);
        self.cache.get_or_compute(i, || {
            let x = &samples[i].features;
            samples
                .iter()
                .zip(norms)
                .map(|(s, &norm)| kernel.compute_with_norms(x, &s.features, norms[i], norm))
                .collect()
        })
    }
}

/// Mutable state of one dual optimization
struct DualProblem<'a, K: Kernel> {
    rows: KernelRows<'a, K>,
    y: Vec<f64>,
    diag: Vec<f64>,
    p: Vec<f64>,
    alpha: Vec<f64>,
    /// Gradient Qα + p
    grad: Vec<f64>,
    upper: f64,
}

impl<'a, K: Kernel> DualProblem<'a, K> {
    fn new(
        kernel: &'a K,
        samples: &'a [Sample],
        cache_size: usize,
        alpha: Vec<f64>,
        p: Vec<f64>,
        upper: f64,
    ) -> Result<Self> {
        let n = samples.len();
        let norms: Vec<f64> = samples.iter().map(|s| s.features.norm_squared()).collect();
        let diag: Vec<f64> = samples
            .iter()
            .zip(&norms)
            .map(|(s, &norm)| kernel.compute_with_norms(&s.features, &s.features, norm, norm))
            .collect();
        if diag.iter().any(|k| !k.is_finite()) {
            return Err(SVMError::OptimizationError(
                "kernel produced non-finite values on the training data".to_string(),
            ));
        }

        let mut problem = Self {
            rows: KernelRows {
                kernel,
                samples,
                norms,
                cache: KernelCache::with_memory_limit(cache_size, n),
            },
            y: samples.iter().map(|s| s.label).collect(),
            diag,
            grad: p.clone(),
            p,
            alpha,
            upper,
        };

        for i in 0..n {
            if problem.alpha[i] > 0.0 {
                let row = problem.rows.row(i);
                let (a_i, y_i) = (problem.alpha[i], problem.y[i]);
                for (k, g) in problem.grad.iter_mut().enumerate() {
                    *g += a_i * y_i * problem.y[k] * row[k];
                }
            }
        }

        Ok(problem)
    }

    fn is_upper(&self, i: usize) -> bool {
        self.alpha[i] >= self.upper
    }

    fn is_lower(&self, i: usize) -> bool {
        self.alpha[i] <= 0.0
    }

    fn select_pair(&mut self, formulation: Formulation, eps: f64) -> Option<(usize, usize)> {
        match formulation {
            Formulation::C => self.select_c(eps),
            Formulation::Nu => self.select_nu(eps),
        }
    }

    /// Maximal violating `i`, then the `j` with the largest second-order gain
    fn select_c(&mut self, eps: f64) -> Option<(usize, usize)> {
        let mut gmax = f64::NEG_INFINITY;
        let mut first = None;
        for t in 0..self.alpha.len() {
            let violation = if self.y[t] > 0.0 {
                (!self.is_upper(t)).then(|| -self.grad[t])
            } else {
                (!self.is_lower(t)).then(|| self.grad[t])
            };
            if let Some(v) = violation {
                if v >= gmax {
                    gmax = v;
                    first = Some(t);
                }
            }
        }

        let i = first?;
        let row_i = self.rows.row(i);
        let mut gmax2 = f64::NEG_INFINITY;
        let mut best = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..self.alpha.len() {
            let grad_diff = if self.y[t] > 0.0 {
                if self.is_lower(t) {
                    continue;
                }
                gmax2 = gmax2.max(self.grad[t]);
                gmax + self.grad[t]
            } else {
                if self.is_upper(t) {
                    continue;
                }
                gmax2 = gmax2.max(-self.grad[t]);
                gmax - self.grad[t]
            };

            if grad_diff > 0.0 {
                let obj_diff = self.pair_gain(i, t, row_i[t], grad_diff);
                if obj_diff <= obj_diff_min {
                    obj_diff_min = obj_diff;
                    best = Some(t);
                }
            }
        }

        if gmax + gmax2 < eps {
            return None;
        }
        best.map(|j| (i, j))
    }

    /// Like `select_c`, but both variables come from the same class
    fn select_nu(&mut self, eps: f64) -> Option<(usize, usize)> {
        let mut gmaxp = f64::NEG_INFINITY;
        let mut gmaxn = f64::NEG_INFINITY;
        let (mut ip, mut in_) = (None, None);

        for t in 0..self.alpha.len() {
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.grad[t] >= gmaxp {
                    gmaxp = -self.grad[t];
                    ip = Some(t);
                }
            } else if !self.is_lower(t) && self.grad[t] >= gmaxn {
                gmaxn = self.grad[t];
                in_ = Some(t);
            }
        }

        let row_p = ip.map(|i| self.rows.row(i));
        let row_n = in_.map(|i| self.rows.row(i));
        let mut gmaxp2 = f64::NEG_INFINITY;
        let mut gmaxn2 = f64::NEG_INFINITY;
        let mut best = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..self.alpha.len() {
            let candidate = if self.y[t] > 0.0 {
                if self.is_lower(t) {
                    continue;
                }
                gmaxp2 = gmaxp2.max(self.grad[t]);
                ip.zip(row_p.as_ref()).map(|(i, row)| (i, row[t], gmaxp + self.grad[t]))
            } else {
                if self.is_upper(t) {
                    continue;
                }
                gmaxn2 = gmaxn2.max(-self.grad[t]);
                in_.zip(row_n.as_ref()).map(|(i, row)| (i, row[t], gmaxn - self.grad[t]))
            };

            if let Some((i, k_it, grad_diff)) = candidate {
                if grad_diff > 0.0 {
                    let obj_diff = self.pair_gain(i, t, k_it, grad_diff);
                    if obj_diff <= obj_diff_min {
                        obj_diff_min = obj_diff;
                        best = Some((i, t));
                    }
                }
            }
        }

        if (gmaxp + gmaxp2).max(gmaxn + gmaxn2) < eps {
            return None;
        }
        best
    }

    /// Decrease of the objective from a Newton step on the pair (i, t)
    fn pair_gain(&self, i: usize, t: usize, k_it: f64, grad_diff: f64) -> f64 {
        let mut quad = self.diag[i] + self.diag[t] - 2.0 * k_it;
        if quad <= 0.0 {
            quad = TAU;
        }
        -(grad_diff * grad_diff) / quad
    }

    /// Analytic two-variable step, clipped to the box and the equality constraint
    fn update_pair(&mut self, i: usize, j: usize) -> Result<()> {
        let row_i = self.rows.row(i);
        let row_j = self.rows.row(j);
        let c = self.upper;
        let (old_ai, old_aj) = (self.alpha[i], self.alpha[j]);
        let (mut ai, mut aj) = (old_ai, old_aj);

        let mut quad = self.diag[i] + self.diag[j] - 2.0 * row_i[j];
        if quad <= 0.0 {
            quad = TAU;
        }

        if self.y[i] != self.y[j] {
            let delta = (-self.grad[i] - self.grad[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;

            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let delta = (self.grad[i] - self.grad[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;

            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        if !(ai.is_finite() && aj.is_finite()) {
            return Err(SVMError::OptimizationError(format!(
                "non-finite update for pair ({i}, {j})"
            )));
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let (yi_di, yj_dj) = (self.y[i] * (ai - old_ai), self.y[j] * (aj - old_aj));
        for (k, g) in self.grad.iter_mut().enumerate() {
            *g += self.y[k] * (yi_di * row_i[k] + yj_dj * row_j[k]);
        }

        Ok(())
    }

    /// Offset for the C formulation: mean of yG over free variables
    fn rho_c(&self) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0usize;

        for i in 0..self.alpha.len() {
            let yg = self.y[i] * self.grad[i];
            if self.is_upper(i) {
                if self.y[i] < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if self.is_lower(i) {
                if self.y[i] > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Offset and margin scale `(rho, r)` for the ν formulation
    fn rho_nu(&self) -> (f64, f64) {
        let class_offset = |positive: bool| {
            let mut ub = f64::INFINITY;
            let mut lb = f64::NEG_INFINITY;
            let mut sum_free = 0.0;
            let mut n_free = 0usize;

            for i in (0..self.alpha.len()).filter(|&i| (self.y[i] > 0.0) == positive) {
                if self.is_upper(i) {
                    lb = lb.max(self.grad[i]);
                } else if self.is_lower(i) {
                    ub = ub.min(self.grad[i]);
                } else {
                    n_free += 1;
                    sum_free += self.grad[i];
                }
            }

            if n_free > 0 {
                sum_free / n_free as f64
            } else {
                (ub + lb) / 2.0
            }
        };

        let r1 = class_offset(true);
        let r2 = class_offset(false);
        ((r1 - r2) / 2.0, (r1 + r2) / 2.0)
    }

    fn objective(&self) -> f64 {
        self.alpha
            .iter()
            .zip(self.grad.iter().zip(&self.p))
            .map(|(a, (g, p))| a * (g + p))
            .sum::<f64>()
            / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use crate::kernel::{LinearKernel, RBFKernel};
    use approx::assert_relative_eq;

    fn point(values: &[f64], label: f64) -> Sample {
        Sample::new(SparseVector::from_dense(values), label)
    }

    fn linear_solver(config: OptimizerConfig) -> SMOSolver<LinearKernel> {
        SMOSolver::new(Arc::new(LinearKernel::new()), config)
    }

    fn decision<K: Kernel>(kernel: &K, samples: &[Sample], result: &OptimizationResult, x: &SparseVector) -> f64 {
        samples
            .iter()
            .zip(&result.alpha)
            .map(|(s, a)| a * s.label * kernel.compute(&s.features, x))
            .sum::<f64>()
            + result.b
    }

    fn separable_2d() -> Vec<Sample> {
        vec![
            point(&[2.0, 2.0], 1.0),
            point(&[3.0, 1.5], 1.0),
            point(&[2.5, 3.0], 1.0),
            point(&[3.5, 2.5], 1.0),
            point(&[-2.0, -2.0], -1.0),
            point(&[-3.0, -1.0], -1.0),
            point(&[-2.5, -3.0], -1.0),
            point(&[-1.5, -2.5], -1.0),
        ]
    }

    #[test]
    fn test_smo_solver_empty_dataset() {
        let solver = linear_solver(OptimizerConfig::default());
        assert!(matches!(solver.solve(&[]), Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_smo_solver_invalid_labels() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![point(&[1.0], 1.0), point(&[2.0], 0.5)];

        assert!(matches!(
            solver.solve(&samples),
            Err(SVMError::InvalidLabel(l)) if l == 0.5
        ));
    }

    #[test]
    fn test_smo_solver_requires_both_classes() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![point(&[1.0], 1.0), point(&[2.0], 1.0)];

        assert!(matches!(
            solver.solve(&samples),
            Err(SVMError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_two_point_c_solution() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![point(&[1.0], 1.0), point(&[-1.0], -1.0)];

        let result = solver.solve(&samples).unwrap();

        // Closed form: α = (0.5, 0.5), b = 0, f(x) = x
        assert_relative_eq!(result.alpha[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.alpha[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.b, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.objective_value, -0.5, epsilon = 1e-12);
        assert_eq!(result.support_vectors, vec![0, 1]);
        assert_eq!(result.iterations, 1);

        let x = SparseVector::from_dense(&[0.25]);
        assert_relative_eq!(
            decision(&LinearKernel::new(), &samples, &result, &x),
            0.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_two_point_nu_solution() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![point(&[1.0], 1.0), point(&[-1.0], -1.0)];

        let result = solver.solve_nu(&samples, 0.5).unwrap();

        // Same separating function as the C formulation after rescaling
        assert_relative_eq!(result.alpha[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.alpha[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.b, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nu_infeasible() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![
            point(&[1.0], 1.0),
            point(&[2.0], 1.0),
            point(&[3.0], 1.0),
            point(&[-1.0], -1.0),
        ];

        // ν·n/2 = 1.8 exceeds the single negative sample's box
        assert!(matches!(
            solver.solve_nu(&samples, 0.9),
            Err(SVMError::OptimizationError(_))
        ));
        assert!(matches!(
            solver.solve_nu(&samples, 0.0),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_c_solution_respects_constraints() {
        let config = OptimizerConfig {
            c: 10.0,
            ..OptimizerConfig::default()
        };
        let solver = linear_solver(config);
        let samples = separable_2d();

        let result = solver.solve(&samples).unwrap();

        let balance: f64 = samples.iter().zip(&result.alpha).map(|(s, a)| a * s.label).sum();
        assert!(balance.abs() < 1e-9);
        assert!(result.alpha.iter().all(|&a| (0.0..=10.0).contains(&a)));
        assert!(!result.support_vectors.is_empty());

        let kernel = LinearKernel::new();
        for s in &samples {
            assert!(s.label * decision(&kernel, &samples, &result, &s.features) > 0.0);
        }
    }

    #[test]
    fn test_nu_solution_separates_with_rbf() {
        let solver = SMOSolver::new(Arc::new(RBFKernel::new(0.5)), OptimizerConfig::default());
        let samples = separable_2d();

        let result = solver.solve_nu(&samples, 0.5).unwrap();

        let balance: f64 = samples.iter().zip(&result.alpha).map(|(s, a)| a * s.label).sum();
        assert!(balance.abs() < 1e-9);

        let kernel = RBFKernel::new(0.5);
        for s in &samples {
            assert!(s.label * decision(&kernel, &samples, &result, &s.features) > 0.0);
        }
    }

    #[test]
    fn test_max_iterations_returns_partial_solution() {
        let config = OptimizerConfig {
            max_iterations: 1,
            epsilon: 1e-5,
            ..OptimizerConfig::default()
        };
        let solver = linear_solver(config);
        let samples = vec![
            point(&[1.0, 1.0], 1.0),
            point(&[-1.0, -1.0], -1.0),
            point(&[1.0, -1.0], 1.0),
            point(&[-1.0, 1.0], -1.0),
        ];

        let result = solver.solve(&samples).expect("hitting max_iter is not an error");
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_identical_features_different_labels() {
        let solver = linear_solver(OptimizerConfig::default());
        let samples = vec![point(&[1.0], 1.0), point(&[1.0], -1.0)];

        let result = solver.solve(&samples).unwrap();

        assert!(result.b.is_finite());
        assert!(result.alpha.iter().all(|&a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn test_non_positive_c_rejected() {
        let config = OptimizerConfig {
            c: 0.0,
            ..OptimizerConfig::default()
        };
        let solver = linear_solver(config);
        let samples = vec![point(&[1.0], 1.0), point(&[-1.0], -1.0)];

        assert!(matches!(
            solver.solve(&samples),
            Err(SVMError::InvalidParameter(_))
        ));
    }
}
