//! CSV format dataset implementation
//!
//! - The last column is the integer class label
//! - All other columns are numeric features
//! - A header row is detected automatically
//! - Lines starting with `#` are comments

use crate::core::{Dataset, Result, SVMError, SparseVector};
use crate::data::parse_class_label;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Dataset implementation for CSV format files
#[derive(Debug, Clone)]
pub struct CSVDataset {
    features: Vec<SparseVector>,
    labels: Vec<i64>,
    dimensions: usize,
}

impl CSVDataset {
    /// Load a dataset from a CSV file, detecting a header row
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load a dataset, optionally treating a non-numeric first row as a header
    pub fn from_reader_with_options<R: Read>(reader: R, auto_detect_header: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut dimensions = None;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| SVMError::ParseError(format!("Error reading CSV row {}: {e}", row_idx + 1)))?;

            if record.iter().all(str::is_empty) {
                continue;
            }
            if row_idx == 0 && auto_detect_header && Self::is_header(&record) {
                continue;
            }

            let (label, row) = Self::parse_record(&record)
                .map_err(|e| SVMError::ParseError(format!("Error parsing CSV row {}: {e}", row_idx + 1)))?;

            let width = record.len() - 1;
            match dimensions {
                None => dimensions = Some(width),
                Some(d) if d != width => {
                    return Err(SVMError::InvalidDataset(format!(
                        "CSV row {} has {} features, expected {}",
                        row_idx + 1,
                        width,
                        d
                    )))
                }
                Some(_) => {}
            }

            features.push(row);
            labels.push(label);
        }

        let Some(dimensions) = dimensions else {
            return Err(SVMError::EmptyDataset);
        };

        Ok(CSVDataset {
            features,
            labels,
            dimensions,
        })
    }

    /// A header has mostly non-numeric feature columns
    fn is_header(record: &csv::StringRecord) -> bool {
        if record.len() < 2 {
            return false;
        }

        let feature_columns = record.len() - 1;
        let non_numeric = record
            .iter()
            .take(feature_columns)
            .filter(|field| field.parse::<f64>().is_err())
            .count();

        non_numeric * 2 > feature_columns
    }

    fn parse_record(record: &csv::StringRecord) -> Result<(i64, SparseVector)> {
        if record.len() < 2 {
            return Err(SVMError::ParseError(format!(
                "Row has too few fields: {}",
                record.len()
            )));
        }

        let label_column = record.len() - 1;
        let label = parse_class_label(&record[label_column])?;

        let values = record
            .iter()
            .take(label_column)
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|_| SVMError::ParseError(format!("Invalid feature value: {field}")))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok((label, SparseVector::from_dense(&values)))
    }
}

impl Dataset for CSVDataset {
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
