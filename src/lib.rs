//! Multi-class Support Vector Machines
//!
//! One-vs-one and one-vs-rest decomposition over binary SVMs trained with a
//! second-order SMO solver. Linear, kernel C-SVC and ν-SVC formulations are
//! available as presets of one generic estimator.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod multiclass;
pub mod parallel;
pub mod persistence;
pub mod solver;
pub mod svc;

// Re-export main types for convenience
pub use crate::api::{
    ConfusionMatrix, FittedModel, MultiClassSvc, MultiKernelSvc, MultiLinearSvc, MultiNuSvc,
};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{ErrorKind, Result, SVMError};
pub use crate::data::{CSVDataset, LibSVMDataset};
pub use crate::kernel::{Gamma, Kernel, KernelFunction, KernelSpec};
pub use crate::multiclass::{
    BinaryClassifierFactory, DecompositionMethod, KernelParams, LinearParams, NuParams, SvcKind,
};
pub use crate::persistence::{ModelMetadata, SavedModel};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
