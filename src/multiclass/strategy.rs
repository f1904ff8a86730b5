//! Training and evaluation of the binary tasks of a plan

use crate::core::{BinaryClassifier, BinaryModel, Result, Sample, SparseVector};
use crate::multiclass::{BinaryClassifierFactory, BinaryTask, DecompositionPlan, ModelOf};
use crate::parallel::Parallelism;
use log::debug;

/// Rows of one task relabelled to ±1; rows outside the task are dropped
pub fn task_samples(
    task: &BinaryTask,
    features: &[SparseVector],
    class_indices: &[usize],
) -> Vec<Sample> {
    features
        .iter()
        .zip(class_indices)
        .filter_map(|(x, &class)| task.target(class).map(|y| Sample::new(x.clone(), y)))
        .collect()
}

/// Train one classifier per task, in plan order
///
/// Every classifier sees the same `n_features`, the width of `features`.
/// The first failing task fails the whole fit; nothing partial is returned.
pub fn fit_tasks<F: BinaryClassifierFactory>(
    factory: &F,
    plan: &DecompositionPlan,
    features: &[SparseVector],
    class_indices: &[usize],
    n_features: usize,
    parallelism: Parallelism,
) -> Result<Vec<ModelOf<F>>> {
    parallelism
        .maybe_par_map(plan.tasks(), |task| {
            let samples = task_samples(task, features, class_indices);
            debug!("training {:?} on {} rows", task, samples.len());
            factory.build()?.fit(&samples, n_features)
        })
        .into_iter()
        .collect()
}

/// Decision values of every task for every row: `result[row][task]`
pub fn decision_matrix<M: BinaryModel>(
    models: &[M],
    rows: &[SparseVector],
    parallelism: Parallelism,
) -> Vec<Vec<f64>> {
    parallelism.maybe_par_map(rows, |x| {
        models.iter().map(|m| m.decision_function(x)).collect()
    })
}
