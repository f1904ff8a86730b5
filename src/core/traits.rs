//! Core traits: labels, datasets and the binary classifier contract

use crate::core::{Prediction, Result, Sample, SparseVector};
use std::fmt::Debug;

/// Class label usable by the multi-class estimators
///
/// Labels only need a total order; the class set is enumerated in ascending order.
pub trait Label: Clone + Ord + Debug + Send + Sync {}

impl<T: Clone + Ord + Debug + Send + Sync> Label for T {}

/// Labeled dataset abstraction
pub trait Dataset: Send + Sync {
    type Label: Label;

    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Feature rows, one per sample
    fn features(&self) -> &[SparseVector];

    /// Labels, positionally aligned with `features`
    fn labels(&self) -> &[Self::Label];

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An untrained two-class classifier
pub trait BinaryClassifier: Send + Sync {
    type Model: BinaryModel;

    /// Train on samples labeled +1 / -1
    ///
    /// `n_features` is the width of the full training matrix, which may
    /// exceed the widest row in `samples`.
    fn fit(&self, samples: &[Sample], n_features: usize) -> Result<Self::Model>;
}

/// Trained two-class model
pub trait BinaryModel: Send + Sync {
    /// Signed decision value; positive means the +1 class
    fn decision_function(&self, x: &SparseVector) -> f64;

    /// Predict a single feature vector
    fn predict(&self, x: &SparseVector) -> Prediction {
        Prediction::from_decision(self.decision_function(x))
    }

    /// Predict multiple feature vectors
    fn predict_batch(&self, xs: &[SparseVector]) -> Vec<Prediction> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
