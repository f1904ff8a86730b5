//! Decomposition of a K-class problem into binary tasks
//!
//! One-vs-one trains a classifier for every pair of classes `i < j` and
//! predicts by majority vote. One-vs-rest trains one classifier per class
//! against all others and predicts the class with the largest decision value.
//! Ties in either scheme go to the lowest class index.

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decomposition scheme, selected by name ("ovo" / "ovr")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionMethod {
    #[serde(rename = "ovo")]
    OneVsOne,
    #[serde(rename = "ovr")]
    OneVsRest,
}

impl DecompositionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecompositionMethod::OneVsOne => "ovo",
            DecompositionMethod::OneVsRest => "ovr",
        }
    }
}

impl FromStr for DecompositionMethod {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ovo" => Ok(DecompositionMethod::OneVsOne),
            "ovr" => Ok(DecompositionMethod::OneVsRest),
            other => Err(SVMError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for DecompositionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One binary sub-problem, in terms of class indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BinaryTask {
    /// Rows of `positive` (+1) against rows of `negative` (-1); others unused
    Pair { positive: usize, negative: usize },
    /// Rows of `positive` (+1) against every other row (-1)
    Rest { positive: usize },
}

impl BinaryTask {
    /// Binary target for a row of class `class`, or `None` if the task skips it
    pub fn target(&self, class: usize) -> Option<f64> {
        match *self {
            BinaryTask::Pair { positive, .. } if class == positive => Some(1.0),
            BinaryTask::Pair { negative, .. } if class == negative => Some(-1.0),
            BinaryTask::Pair { .. } => None,
            BinaryTask::Rest { positive } if class == positive => Some(1.0),
            BinaryTask::Rest { .. } => Some(-1.0),
        }
    }

    /// Class indices named by the task, positive first
    pub fn classes(&self) -> impl Iterator<Item = usize> {
        let (positive, negative) = match *self {
            BinaryTask::Pair { positive, negative } => (positive, Some(negative)),
            BinaryTask::Rest { positive } => (positive, None),
        };
        std::iter::once(positive).chain(negative)
    }
}

/// Ordered list of binary tasks for a fitted class set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionPlan {
    method: DecompositionMethod,
    n_classes: usize,
    tasks: Vec<BinaryTask>,
}

impl DecompositionPlan {
    pub fn new(method: DecompositionMethod, n_classes: usize) -> Self {
        let tasks = match method {
            DecompositionMethod::OneVsOne => (0..n_classes)
                .flat_map(|i| {
                    (i + 1..n_classes).map(move |j| BinaryTask::Pair {
                        positive: i,
                        negative: j,
                    })
                })
                .collect(),
            DecompositionMethod::OneVsRest => (0..n_classes)
                .map(|positive| BinaryTask::Rest { positive })
                .collect(),
        };

        Self {
            method,
            n_classes,
            tasks,
        }
    }

    pub fn method(&self) -> DecompositionMethod {
        self.method
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn tasks(&self) -> &[BinaryTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Per-class scores for one row, given one decision value per task
    ///
    /// One-vs-one: vote counts (decision ≥ 0 votes for the pair's first class).
    /// One-vs-rest: each class's own decision value.
    pub fn class_scores(&self, decisions: &[f64]) -> Vec<f64> {
        let mut scores = vec![0.0; self.n_classes];
        for (task, &decision) in self.tasks.iter().zip(decisions) {
            match *task {
                BinaryTask::Pair { positive, negative } => {
                    let winner = if decision >= 0.0 { positive } else { negative };
                    scores[winner] += 1.0;
                }
                BinaryTask::Rest { positive } => scores[positive] = decision,
            }
        }
        scores
    }

    /// Winning class index for one row
    pub fn winner(&self, decisions: &[f64]) -> usize {
        argmax_lowest(&self.class_scores(decisions))
    }
}

/// Index of the largest score; the first one wins ties
fn argmax_lowest(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}
