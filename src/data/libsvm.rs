//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Labels are integer class ids, indices are 1-based. Example:
//! 3 1:0.5 3:1.2 7:0.8
//! 1 2:0.3 5:2.1

use crate::core::{Dataset, Result, SVMError, SparseVector};
use crate::data::parse_class_label;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    features: Vec<SparseVector>,
    labels: Vec<i64>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (label, row) = Self::parse_line(line).map_err(|e| {
                SVMError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            dimensions = dimensions.max(row.dim());
            features.push(row);
            labels.push(label);
        }

        if features.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            features,
            labels,
            dimensions,
        })
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> Result<(i64, SparseVector)> {
        let mut parts = line.split_whitespace();
        let label = parse_class_label(
            parts
                .next()
                .ok_or_else(|| SVMError::ParseError("Empty line".to_string()))?,
        )?;

        let mut indices = Vec::new();
        let mut values = Vec::new();

        for feature_str in parts {
            let (index, value) = feature_str.split_once(':').ok_or_else(|| {
                SVMError::ParseError(format!("Invalid feature format: {feature_str}"))
            })?;

            let index = index
                .parse::<usize>()
                .map_err(|_| SVMError::ParseError(format!("Invalid feature index: {index}")))?;
            let value = value
                .parse::<f64>()
                .map_err(|_| SVMError::ParseError(format!("Invalid feature value: {value}")))?;

            // libsvm uses 1-based indexing
            if index == 0 {
                return Err(SVMError::ParseError(
                    "Feature index must be positive: 0".to_string(),
                ));
            }

            indices.push(index - 1);
            values.push(value);
        }

        Ok((label, SparseVector::new(indices, values)))
    }
}

impl Dataset for LibSVMDataset {
    type Label = i64;

    fn len(&self) -> usize {
        self.features.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn features(&self) -> &[SparseVector] {
        &self.features
    }

    fn labels(&self) -> &[i64] {
        &self.labels
    }
}
