//! Binary SVM classifiers used as building blocks for multi-class decomposition

pub mod kernel;
pub mod linear;

pub use self::kernel::*;
pub use self::linear::*;
