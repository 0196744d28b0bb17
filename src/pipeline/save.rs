//! Trained model artifact and its on-disk format.
//!
//! The artifact is a single `bincode` file holding the fitted feature composer,
//! the fitted classifier and training metadata. A format tag and version are
//! checked on load so stale or foreign files fail loudly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::compose::FeatureComposer;
use super::config::ModelKind;
use crate::error::{DetectorError, Result};

/// Tag written into every artifact.
pub const ARTIFACT_FORMAT: &str = "phishing-detector";

/// Current artifact layout version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Facts about the training run stored with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub model_kind: ModelKind,
    pub n_features: usize,
    /// Training rows seen by the classifier, after balancing
    pub n_train: usize,
    pub seed: u64,
    pub balanced: bool,
    /// Test-set accuracy at training time
    pub test_accuracy: f64,
}

/// Immutable bundle of everything prediction needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    format: String,
    version: u32,
    pub composer: FeatureComposer,
    pub classifier: Classifier,
    pub metadata: TrainingMetadata,
}

impl TrainedModel {
    pub fn new(composer: FeatureComposer, classifier: Classifier, metadata: TrainingMetadata) -> Self {
        TrainedModel {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            composer,
            classifier,
            metadata,
        }
    }

    /// Load an artifact written by [`save_model`].
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or decoded, carries a different format tag
    /// or version, or holds an unfitted composer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut model: TrainedModel = bincode::deserialize(&bytes)?;

        if model.format != ARTIFACT_FORMAT {
            return Err(DetectorError::artifact(format!(
                "{} is not a phishing-detector model (format '{}')",
                path.display(),
                model.format
            )));
        }
        if model.version != ARTIFACT_VERSION {
            return Err(DetectorError::artifact(format!(
                "unsupported model version {} (expected {})",
                model.version, ARTIFACT_VERSION
            )));
        }
        if !model.composer.is_fitted() {
            return Err(DetectorError::artifact("model holds an unfitted feature composer"));
        }

        model.composer.warm();
        log::info!(
            "Loaded {} model from {} ({} features)",
            model.metadata.model_kind,
            path.display(),
            model.metadata.n_features
        );
        Ok(model)
    }
}

/// Save a trained model to disk, creating parent directories as needed.
///
/// # Arguments
///
/// * `model` - The trained model bundle
/// * `path` - Destination file
pub fn save_model<P: AsRef<Path>>(model: &TrainedModel, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, model)?;
    writer.flush()?;

    log::info!("Model written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classifier::LogisticRegression;
    use crate::pipeline::config::FeaturesConfig;

    fn unfitted_model() -> TrainedModel {
        TrainedModel::new(
            FeatureComposer::new(&FeaturesConfig::default()),
            Classifier::Linear(LogisticRegression {
                weights: vec![0.0; 9],
                intercept: 0.0,
                n_iter: 0,
                converged: true,
            }),
            TrainingMetadata {
                model_kind: ModelKind::Linear,
                n_features: 9,
                n_train: 0,
                seed: 42,
                balanced: false,
                test_accuracy: 0.0,
            },
        )
    }

    #[test]
    fn test_load_rejects_unfitted_composer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.bin");
        save_model(&unfitted_model(), &path).unwrap();
        assert!(path.exists());

        let err = TrainedModel::load(&path).unwrap_err();
        assert!(matches!(err, DetectorError::Artifact(_)));
    }

    #[test]
    fn test_load_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"definitely not a model").unwrap();
        assert!(TrainedModel::load(&path).is_err());

        let mut model = unfitted_model();
        model.format = "something-else".to_string();
        let path = dir.path().join("foreign.bin");
        save_model(&model, &path).unwrap();
        let err = TrainedModel::load(&path).unwrap_err();
        assert!(err.to_string().contains("not a phishing-detector model"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TrainedModel::load("/nonexistent/model.bin").unwrap_err();
        assert!(matches!(err, DetectorError::Io(_)));
    }
}
