//! Data loading and dataset implementations
//!
//! Both formats carry integer class labels; any number of classes is allowed.

pub mod csv;
pub mod libsvm;

pub use self::csv::*;
pub use self::libsvm::*;

use crate::core::{Dataset, Result, SVMError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Parse a class label such as `3`, `+1`, `-2` or `2.0`
///
/// Non-integral numbers are rejected rather than rounded.
pub fn parse_class_label(field: &str) -> Result<i64> {
    let field = field.trim();
    if let Ok(label) = field.parse::<i64>() {
        return Ok(label);
    }

    match field.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(SVMError::ParseError(format!(
            "Invalid class label: {field:?} (expected an integer)"
        ))),
    }
}

/// On-disk dataset format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `.csv` files are CSV, everything else LibSVM
    Auto,
    LibSVM,
    Csv,
}

impl DataFormat {
    pub fn resolve(self, path: &Path) -> DataFormat {
        match self {
            DataFormat::Auto => {
                let is_csv = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
                if is_csv {
                    DataFormat::Csv
                } else {
                    DataFormat::LibSVM
                }
            }
            explicit => explicit,
        }
    }
}

impl FromStr for DataFormat {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DataFormat::Auto),
            "libsvm" => Ok(DataFormat::LibSVM),
            "csv" => Ok(DataFormat::Csv),
            other => Err(SVMError::InvalidParameter(format!(
                "unknown data format {other:?} (expected auto, libsvm or csv)"
            ))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Auto => f.write_str("auto"),
            DataFormat::LibSVM => f.write_str("libsvm"),
            DataFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Load a labelled dataset from `path` in the given format
pub fn load_dataset<P: AsRef<Path>>(
    path: P,
    format: DataFormat,
) -> Result<Box<dyn Dataset<Label = i64>>> {
    let path = path.as_ref();
    Ok(match format.resolve(path) {
        DataFormat::Csv => Box::new(CSVDataset::from_file(path)?),
        _ => Box::new(LibSVMDataset::from_file(path)?),
    })
}
