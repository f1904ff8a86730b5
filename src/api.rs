//! High-level multi-class SVM estimators
//!
//! [`MultiClassSvc`] wraps a binary classifier factory and a decomposition
//! method (`"ovo"` or `"ovr"`) behind the usual configure → fit → predict →
//! score contract. Three presets bind it to the available binary formulations.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use multisvm::api::MultiKernelSvc;
//! use multisvm::core::SparseVector;
//! use multisvm::multiclass::KernelParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let x = vec![
//!     SparseVector::from_dense(&[0.0, 0.1]),
//!     SparseVector::from_dense(&[5.0, 0.2]),
//!     SparseVector::from_dense(&[0.1, 5.0]),
//! ];
//! let y = vec!["a", "b", "c"];
//!
//! let mut svc = MultiKernelSvc::new(KernelParams::default().with_c(10.0)).with_method("ovr");
//! svc.fit(&x, &y)?;
//! println!("{:?}", svc.predict(&x)?);
//! println!("accuracy: {:.2}", svc.score(&x, &y)?);
//! # Ok(())
//! # }
//! ```

use crate::core::{BinaryModel, Dataset, Label, Result, SVMError, SparseVector};
use crate::data::{CSVDataset, LibSVMDataset};
use crate::multiclass::{
    decision_matrix, fit_tasks, BinaryClassifierFactory, ClassSet, DecompositionMethod,
    DecompositionPlan, KernelParams, LinearParams, ModelOf, NuParams,
};
use crate::parallel::{run_with_workers, Workers};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Multi-class estimator over linear binary SVMs
pub type MultiLinearSvc<L> = MultiClassSvc<LinearParams, L>;

/// Multi-class estimator over kernel C-SVMs
pub type MultiKernelSvc<L> = MultiClassSvc<KernelParams, L>;

/// Multi-class estimator over ν-SVMs
pub type MultiNuSvc<L> = MultiClassSvc<NuParams, L>;

/// Everything a successful fit produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel<M, L> {
    classes: ClassSet<L>,
    plan: DecompositionPlan,
    estimators: Vec<M>,
    n_features: usize,
}

impl<M: BinaryModel, L: Label> FittedModel<M, L> {
    pub fn classes(&self) -> &ClassSet<L> {
        &self.classes
    }

    pub fn plan(&self) -> &DecompositionPlan {
        &self.plan
    }

    /// Binary models in plan order
    pub fn estimators(&self) -> &[M] {
        &self.estimators
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_support_vectors(&self) -> usize {
        self.estimators.iter().map(|m| m.n_support_vectors()).sum()
    }

    /// Check that the parts agree with each other, e.g. after deserialization
    pub fn validate(&self) -> Result<()> {
        if !self.classes.labels().windows(2).all(|w| w[0] < w[1]) {
            return Err(SVMError::InvalidDataset(
                "class labels are not strictly ascending".to_string(),
            ));
        }
        if self.plan.n_classes() != self.classes.len() {
            return Err(SVMError::InvalidDataset(format!(
                "plan covers {} classes but the model lists {}",
                self.plan.n_classes(),
                self.classes.len()
            )));
        }
        if self.estimators.len() != self.plan.len() {
            return Err(SVMError::InvalidDataset(format!(
                "plan has {} tasks but the model holds {} classifiers",
                self.plan.len(),
                self.estimators.len()
            )));
        }
        let n_classes = self.classes.len();
        if let Some(task) = self
            .plan
            .tasks()
            .iter()
            .find(|task| task.classes().any(|class| class >= n_classes))
        {
            return Err(SVMError::InvalidDataset(format!(
                "task {task:?} refers to a class outside 0..{n_classes}"
            )));
        }
        Ok(())
    }

    /// Features never seen in training are allowed and contribute nothing
    fn check_rows(&self, x: &[SparseVector]) -> Result<()> {
        match x.iter().position(|row| !row.is_finite()) {
            Some(i) => Err(SVMError::InvalidDataset(format!(
                "row {i} contains non-finite values"
            ))),
            None => Ok(()),
        }
    }
}

enum FitState<M, L> {
    Unfitted,
    Fitted(FittedModel<M, L>),
}

/// Multi-class SVM built from binary classifiers of factory `F`
pub struct MultiClassSvc<F: BinaryClassifierFactory, L: Label> {
    params: F,
    method: String,
    n_jobs: Option<i32>,
    state: FitState<ModelOf<F>, L>,
}

impl<F: BinaryClassifierFactory + Default, L: Label> Default for MultiClassSvc<F, L> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F: BinaryClassifierFactory, L: Label> MultiClassSvc<F, L> {
    /// One-vs-one, sequential
    pub fn new(params: F) -> Self {
        Self {
            params,
            method: DecompositionMethod::OneVsOne.as_str().to_string(),
            n_jobs: None,
            state: FitState::Unfitted,
        }
    }

    /// Decomposition method name; an unknown name fails at `fit`
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// Worker hint: `1` sequential, `n > 1` threads, `-1` all cores, `-k` all but `k - 1`
    pub fn with_n_jobs(mut self, n_jobs: i32) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub(crate) fn from_fitted(
        params: F,
        n_jobs: Option<i32>,
        fitted: FittedModel<ModelOf<F>, L>,
    ) -> Self {
        Self {
            params,
            method: fitted.plan.method().as_str().to_string(),
            n_jobs,
            state: FitState::Fitted(fitted),
        }
    }

    pub fn params(&self) -> &F {
        &self.params
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn n_jobs(&self) -> Option<i32> {
        self.n_jobs
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, FitState::Fitted(_))
    }

    pub fn fitted(&self) -> Result<&FittedModel<ModelOf<F>, L>> {
        match &self.state {
            FitState::Fitted(fitted) => Ok(fitted),
            FitState::Unfitted => Err(SVMError::NotFitted),
        }
    }

    /// Classes seen at fit time, ascending
    pub fn classes(&self) -> Option<&[L]> {
        self.fitted().ok().map(|f| f.classes.labels())
    }

    pub fn n_estimators(&self) -> Option<usize> {
        self.fitted().ok().map(|f| f.estimators.len())
    }

    pub fn n_features(&self) -> Option<usize> {
        self.fitted().ok().map(|f| f.n_features)
    }

    pub fn plan(&self) -> Option<&DecompositionPlan> {
        self.fitted().ok().map(|f| &f.plan)
    }

    /// Train all binary sub-classifiers, replacing any previous fit
    ///
    /// On error the estimator is left unfitted.
    pub fn fit(&mut self, x: &[SparseVector], y: &[L]) -> Result<&mut Self> {
        self.fit_with_width(x, y, 0)
    }

    fn fit_with_width(&mut self, x: &[SparseVector], y: &[L], width: usize) -> Result<&mut Self> {
        self.state = FitState::Unfitted;
        let fitted = self.fit_model(x, y, width)?;
        self.state = FitState::Fitted(fitted);
        Ok(self)
    }

    /// `width` is a lower bound on the feature count, e.g. a CSV column count
    fn fit_model(
        &self,
        x: &[SparseVector],
        y: &[L],
        width: usize,
    ) -> Result<FittedModel<ModelOf<F>, L>> {
        let method: DecompositionMethod = self.method.parse()?;
        self.params.build()?;
        let workers = Workers::from_n_jobs(self.n_jobs)?;

        if x.len() != y.len() {
            return Err(SVMError::LengthMismatch {
                samples: x.len(),
                labels: y.len(),
            });
        }
        if x.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if let Some(i) = x.iter().position(|row| !row.is_finite()) {
            return Err(SVMError::InvalidDataset(format!(
                "row {i} contains non-finite values"
            )));
        }

        let classes = ClassSet::from_labels(y);
        if classes.len() < 2 {
            return Err(SVMError::TooFewClasses(classes.len()));
        }
        let class_indices = y
            .iter()
            .map(|label| {
                classes.index_of(label).ok_or_else(|| {
                    SVMError::InvalidDataset(format!("label {label:?} missing from class set"))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        let plan = DecompositionPlan::new(method, classes.len());
        let n_features = x.iter().map(SparseVector::dim).fold(width, usize::max);
        debug!(
            "fitting {} binary classifiers ({}) for {} classes on {} rows of width {} with {:?}",
            plan.len(),
            method,
            classes.len(),
            x.len(),
            n_features,
            workers
        );

        let estimators = run_with_workers(workers, |parallelism| {
            fit_tasks(&self.params, &plan, x, &class_indices, n_features, parallelism)
        })??;

        Ok(FittedModel {
            classes,
            plan,
            estimators,
            n_features,
        })
    }

    fn decisions(&self, x: &[SparseVector]) -> Result<(&FittedModel<ModelOf<F>, L>, Vec<Vec<f64>>)> {
        let fitted = self.fitted()?;
        fitted.check_rows(x)?;
        let workers = Workers::from_n_jobs(self.n_jobs)?;
        let decisions = run_with_workers(workers, |parallelism| {
            decision_matrix(&fitted.estimators, x, parallelism)
        })?;
        Ok((fitted, decisions))
    }

    /// One label per row, in row order
    pub fn predict(&self, x: &[SparseVector]) -> Result<Vec<L>> {
        let (fitted, decisions) = self.decisions(x)?;
        Ok(decisions
            .iter()
            .map(|d| fitted.classes.label(fitted.plan.winner(d)).clone())
            .collect())
    }

    /// Per-row, per-class scores, columns in class order
    ///
    /// One-vs-rest returns each class's decision value, one-vs-one its vote count.
    pub fn decision_function(&self, x: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        let (fitted, decisions) = self.decisions(x)?;
        Ok(decisions
            .iter()
            .map(|d| fitted.plan.class_scores(d))
            .collect())
    }

    /// Fraction of rows whose predicted label equals `y`
    pub fn score(&self, x: &[SparseVector], y: &[L]) -> Result<f64> {
        let predictions = self.predict_labeled(x, y)?;
        let correct = predictions.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Multi-class confusion matrix on labelled data
    pub fn evaluate(&self, x: &[SparseVector], y: &[L]) -> Result<ConfusionMatrix<L>> {
        let predictions = self.predict_labeled(x, y)?;
        Ok(ConfusionMatrix::from_predictions(y, &predictions))
    }

    fn predict_labeled(&self, x: &[SparseVector], y: &[L]) -> Result<Vec<L>> {
        self.fitted()?;
        if x.len() != y.len() {
            return Err(SVMError::LengthMismatch {
                samples: x.len(),
                labels: y.len(),
            });
        }
        if x.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        self.predict(x)
    }

    /// Like [`fit`](Self::fit), taking the feature count from `dataset.dim()`
    pub fn fit_dataset<D>(&mut self, dataset: &D) -> Result<&mut Self>
    where
        D: Dataset<Label = L> + ?Sized,
    {
        self.fit_with_width(dataset.features(), dataset.labels(), dataset.dim())
    }

    pub fn predict_dataset<D: Dataset<Label = L> + ?Sized>(&self, dataset: &D) -> Result<Vec<L>> {
        self.predict(dataset.features())
    }

    pub fn score_dataset<D: Dataset<Label = L> + ?Sized>(&self, dataset: &D) -> Result<f64> {
        self.score(dataset.features(), dataset.labels())
    }
}

/// Counts of (actual, predicted) class pairs
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix<L> {
    classes: ClassSet<L>,
    /// `counts[actual][predicted]`
    counts: Vec<Vec<usize>>,
}

impl<L: Label> ConfusionMatrix<L> {
    /// Rows and columns cover every label in either sequence
    pub fn from_predictions(actual: &[L], predicted: &[L]) -> Self {
        let all: Vec<L> = actual.iter().chain(predicted).cloned().collect();
        let classes = ClassSet::from_labels(&all);
        let mut counts = vec![vec![0; classes.len()]; classes.len()];

        for (a, p) in actual.iter().zip(predicted) {
            if let (Some(i), Some(j)) = (classes.index_of(a), classes.index_of(p)) {
                counts[i][j] += 1;
            }
        }

        Self { classes, counts }
    }

    pub fn classes(&self) -> &[L] {
        self.classes.labels()
    }

    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.counts.len()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Rows whose actual class is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// TP / (TP + FP)
    pub fn precision(&self, class: usize) -> f64 {
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();
        ratio(self.counts[class][class], predicted)
    }

    /// TP / (TP + FN)
    pub fn recall(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.support(class))
    }

    pub fn f1_score(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Unweighted mean of per-class F1
    pub fn macro_f1(&self) -> f64 {
        let n = self.classes.len();
        if n == 0 {
            return 0.0;
        }
        (0..n).map(|c| self.f1_score(c)).sum::<f64>() / n as f64
    }

    /// Plain-text per-class report
    pub fn report(&self) -> String {
        let mut out = format!(
            "{:<12} {:>10} {:>10} {:>10} {:>10}\n",
            "class", "precision", "recall", "f1-score", "support"
        );
        for (i, label) in self.classes.labels().iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                format!("{label:?}"),
                self.precision(i),
                self.recall(i),
                self.f1_score(i),
                self.support(i)
            );
        }
        let _ = writeln!(
            out,
            "{:<12} {:>32.4} {:>10}",
            "accuracy",
            self.accuracy(),
            self.total()
        );
        let _ = writeln!(
            out,
            "{:<12} {:>32.4} {:>10}",
            "macro f1",
            self.macro_f1(),
            self.total()
        );
        out
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Convenience functions for quick operations with default kernel settings
pub mod quick {
    use super::*;

    /// Fit a default rbf estimator on a LibSVM file
    pub fn train_libsvm<P: AsRef<Path>>(path: P, method: &str) -> Result<MultiKernelSvc<i64>> {
        let dataset = LibSVMDataset::from_file(path)?;
        let mut svc = MultiKernelSvc::new(KernelParams::default()).with_method(method);
        svc.fit_dataset(&dataset)?;
        Ok(svc)
    }

    /// Fit a default rbf estimator on a CSV file
    pub fn train_csv<P: AsRef<Path>>(path: P, method: &str) -> Result<MultiKernelSvc<i64>> {
        let dataset = CSVDataset::from_file(path)?;
        let mut svc = MultiKernelSvc::new(KernelParams::default()).with_method(method);
        svc.fit_dataset(&dataset)?;
        Ok(svc)
    }

    /// Train on one LibSVM file and report accuracy on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
        method: &str,
    ) -> Result<f64> {
        let svc = train_libsvm(train_path, method)?;
        let test = LibSVMDataset::from_file(test_path)?;
        svc.score_dataset(&test)
    }
}
