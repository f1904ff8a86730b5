//! Dual solvers for the binary sub-problems
//!
//! Implements Sequential Minimal Optimization with second-order working set
//! selection (Fan, Chen and Lin, "Working Set Selection Using Second Order
//! Information for Training SVM", JMLR 2005) for the C and ν formulations.

pub mod smo;

pub use self::smo::*;
