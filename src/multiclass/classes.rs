//! The ordered set of class labels observed at fit time

use crate::core::Label;
use serde::{Deserialize, Serialize};

/// Distinct labels in ascending order
///
/// Class indices used by decomposition plans are positions in this set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassSet<L> {
    labels: Vec<L>,
}

impl<L: Label> ClassSet<L> {
    pub fn from_labels(labels: &[L]) -> Self {
        let mut labels = labels.to_vec();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, label: &L) -> Option<usize> {
        self.labels.binary_search(label).ok()
    }

    /// Label at class index `index`
    ///
    /// # Panics
    /// Panics if `index >= self.len()`
    pub fn label(&self, index: usize) -> &L {
        &self.labels[index]
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }
}
