//! Model serialization and persistence
//!
//! A saved model is one JSON document: metadata, hyperparameters and the
//! fitted state. The metadata can be read on its own to find out which
//! classifier kind a file holds before deserializing the rest.

use crate::api::{FittedModel, MultiClassSvc};
use crate::core::{Label, Result, SVMError};
use crate::multiclass::{BinaryClassifierFactory, ModelOf, SvcKind};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Model metadata for tracking and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub kind: SvcKind,
    /// Decomposition method name, `ovo` or `ovr`
    pub method: String,
    pub n_classes: usize,
    pub n_estimators: usize,
    pub n_features: usize,
}

#[derive(Deserialize)]
struct MetadataOnly {
    metadata: ModelMetadata,
}

impl ModelMetadata {
    /// Read only the metadata of a saved model
    pub fn peek<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let header: MetadataOnly = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(header.metadata)
    }
}

/// Serializable snapshot of a fitted multi-class estimator
///
/// `F` is the hyperparameter set, `M` the binary model type, `L` the label type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel<F, M, L> {
    pub metadata: ModelMetadata,
    pub params: F,
    pub n_jobs: Option<i32>,
    pub fitted: FittedModel<M, L>,
}

impl<F, L> SavedModel<F, ModelOf<F>, L>
where
    F: BinaryClassifierFactory + Clone + Debug + Serialize + DeserializeOwned,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
    L: Label + Serialize + DeserializeOwned,
{
    /// Snapshot a fitted estimator; fails with `NotFitted` otherwise
    pub fn from_estimator(svc: &MultiClassSvc<F, L>) -> Result<Self> {
        let fitted = svc.fitted()?;
        Ok(Self {
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                kind: F::KIND,
                method: fitted.plan().method().as_str().to_string(),
                n_classes: fitted.classes().len(),
                n_estimators: fitted.estimators().len(),
                n_features: fitted.n_features(),
            },
            params: svc.params().clone(),
            n_jobs: svc.n_jobs(),
            fitted: fitted.clone(),
        })
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        debug!("saved {} model to {:?}", self.metadata.kind, path.as_ref());
        Ok(())
    }

    /// Load model from file, checking it holds the expected classifier kind
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.metadata.kind != F::KIND {
            return Err(SVMError::SerializationError(format!(
                "model file holds a {} classifier, expected {}",
                self.metadata.kind,
                F::KIND
            )));
        }
        self.fitted
            .validate()
            .map_err(|e| SVMError::SerializationError(e.to_string()))
    }

    /// Rebuild the fitted estimator
    pub fn into_estimator(self) -> MultiClassSvc<F, L> {
        MultiClassSvc::from_fitted(self.params, self.n_jobs, self.fitted)
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let meta = &self.metadata;
        println!("=== Multi-class SVM Model Summary ===");
        println!("Classifier: {}", meta.kind);
        println!("Method: {}", meta.method);
        println!("Classes: {} {:?}", meta.n_classes, self.fitted.classes().labels());
        println!("Binary classifiers: {}", meta.n_estimators);
        println!("Features: {}", meta.n_features);
        println!("Support vectors: {}", self.fitted.n_support_vectors());
        println!("Library Version: {}", meta.library_version);
        println!("Created: {}", meta.created_at);
        println!("Parameters: {:?}", self.params);
    }
}

/// Save a fitted estimator in one call
pub fn save_estimator<F, L, P>(svc: &MultiClassSvc<F, L>, path: P) -> Result<()>
where
    F: BinaryClassifierFactory + Clone + Debug + Serialize + DeserializeOwned,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
    L: Label + Serialize + DeserializeOwned,
    P: AsRef<Path>,
{
    SavedModel::from_estimator(svc)?.save_to_file(path)
}

/// Load a fitted estimator in one call
pub fn load_estimator<F, L, P>(path: P) -> Result<MultiClassSvc<F, L>>
where
    F: BinaryClassifierFactory + Clone + Debug + Serialize + DeserializeOwned,
    ModelOf<F>: Clone + Serialize + DeserializeOwned,
    L: Label + Serialize + DeserializeOwned,
    P: AsRef<Path>,
{
    Ok(SavedModel::<F, ModelOf<F>, L>::load_from_file(path)?.into_estimator())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MultiKernelSvc, MultiLinearSvc, MultiNuSvc};
    use crate::core::SparseVector;
    use crate::multiclass::{KernelParams, LinearParams, NuParams};
    use tempfile::NamedTempFile;

    fn clusters() -> (Vec<SparseVector>, Vec<i64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (label, (cx, cy)) in [(0, (0.0, 0.0)), (1, (4.0, 0.0)), (2, (0.0, 4.0))] {
            for (dx, dy) in [(0.3, 0.3), (-0.3, 0.3), (0.3, -0.3), (-0.3, -0.3)] {
                x.push(SparseVector::from_dense(&[cx + dx, cy + dy]));
                y.push(label);
            }
        }
        (x, y)
    }

    #[test]
    fn test_unfitted_estimator_cannot_be_saved() {
        let svc: MultiLinearSvc<i64> = MultiClassSvc::default();
        assert!(matches!(
            SavedModel::from_estimator(&svc),
            Err(SVMError::NotFitted)
        ));
    }

    #[test]
    fn test_kernel_model_roundtrip() -> Result<()> {
        let (x, y) = clusters();
        let mut svc = MultiKernelSvc::new(KernelParams::default().with_c(5.0)).with_method("ovr");
        svc.fit(&x, &y)?;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        save_estimator(&svc, temp_file.path())?;

        let meta = ModelMetadata::peek(temp_file.path())?;
        assert_eq!(meta.kind, SvcKind::Kernel);
        assert_eq!(meta.method, "ovr");
        assert_eq!(meta.n_classes, 3);
        assert_eq!(meta.n_estimators, 3);
        assert_eq!(meta.n_features, 2);
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.created_at).is_ok());

        let restored: MultiKernelSvc<i64> = load_estimator(temp_file.path())?;
        assert!(restored.is_fitted());
        assert_eq!(restored.method(), "ovr");
        assert_eq!(restored.params(), svc.params());
        assert_eq!(restored.predict(&x)?, svc.predict(&x)?);
        Ok(())
    }

    #[test]
    fn test_linear_model_roundtrip_preserves_weights() -> Result<()> {
        let (x, y) = clusters();
        let mut svc = MultiLinearSvc::new(LinearParams::default());
        svc.fit(&x, &y)?;

        let saved = SavedModel::from_estimator(&svc)?;
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        saved.save_to_file(temp_file.path())?;

        let loaded = SavedModel::<LinearParams, _, i64>::load_from_file(temp_file.path())?;
        assert_eq!(loaded.fitted, saved.fitted);
        assert_eq!(loaded.metadata, saved.metadata);
        Ok(())
    }

    #[test]
    fn test_kind_mismatch_rejected() -> Result<()> {
        let (x, y) = clusters();
        let mut svc = MultiNuSvc::new(NuParams::default().with_nu(0.3));
        svc.fit(&x, &y)?;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        save_estimator(&svc, temp_file.path())?;

        let err = load_estimator::<KernelParams, i64, _>(temp_file.path())
            .err()
            .unwrap();
        assert!(matches!(err, SVMError::SerializationError(_)));

        let restored: MultiNuSvc<i64> = load_estimator(temp_file.path())?;
        assert_eq!(restored.params().nu, 0.3);
        Ok(())
    }

    #[test]
    fn test_edited_task_indices_rejected() -> Result<()> {
        let (x, y) = clusters();
        let mut svc = MultiLinearSvc::new(LinearParams::default());
        svc.fit(&x, &y)?;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        save_estimator(&svc, temp_file.path())?;

        let text = std::fs::read_to_string(temp_file.path())?;
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["fitted"]["plan"]["tasks"][1]["positive"] = serde_json::json!(7);
        std::fs::write(temp_file.path(), value.to_string())?;

        assert!(matches!(
            load_estimator::<LinearParams, i64, _>(temp_file.path()),
            Err(SVMError::SerializationError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            ModelMetadata::peek("/non/existent/model.json"),
            Err(SVMError::IoError(_))
        ));

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        std::io::Write::write_all(&mut temp_file, b"{ not json").unwrap();
        assert!(matches!(
            ModelMetadata::peek(temp_file.path()),
            Err(SVMError::SerializationError(_))
        ));
    }
}
