//! Multi-class decomposition over binary SVMs

pub mod classes;
pub mod params;
pub mod plan;
pub mod strategy;

pub use self::classes::*;
pub use self::params::*;
pub use self::plan::*;
pub use self::strategy::*;
