//! Configuration structures for the phishing classifier.
//!
//! This module provides strongly-typed configuration management using TOML files.
//! The configuration covers data loading, feature extraction, classifier
//! hyperparameters, balancing, the inference gate, output paths and logging.
//! Every section falls back to its defaults, so a partial `config.toml` is valid.

use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};
use crate::gate::DEFAULT_CONFIDENCE_THRESHOLD;

/// Main configuration structure loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data loading configuration
    pub data: DataConfig,
    /// Feature extraction configuration
    pub features: FeaturesConfig,
    /// Classifier configuration
    pub model: ModelConfig,
    /// Minority oversampling configuration
    pub balance: BalanceConfig,
    /// Inference gate configuration
    pub gate: GateConfig,
    /// Output paths configuration
    pub output: OutputConfig,
    /// Logging and warning policy
    pub logging: LoggingConfig,
}

/// Data loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the CSV dataset file
    pub csv_path: String,
    /// Header of the column holding the message text
    pub text_column: String,
    /// Header of the column holding the categorical label
    pub label_column: String,
    /// Held-out test fraction (e.g., 0.2 = 20% test)
    pub test_size: f64,
    /// Fraction of the dataset to keep for quick runs (1.0 = all)
    pub sample_frac: f64,
    /// Seed shared by every randomized step (split, sampling, SMOTE, trees)
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            csv_path: "data/Phishing_Email.csv".to_string(),
            text_column: "Email Text".to_string(),
            label_column: "Email Type".to_string(),
            test_size: 0.2,
            sample_frac: 1.0,
            seed: 42,
        }
    }
}

/// Settings for one TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Smallest n-gram length (inclusive)
    pub ngram_min: usize,
    /// Largest n-gram length (inclusive)
    pub ngram_max: usize,
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// Vocabulary cap (top terms by corpus frequency)
    pub max_features: usize,
    /// Use `1 + ln(tf)` instead of raw counts
    pub sublinear_tf: bool,
}

impl VectorizerConfig {
    /// Word n-grams 1-3, 80k terms.
    pub fn lexical() -> Self {
        VectorizerConfig {
            ngram_min: 1,
            ngram_max: 3,
            min_df: 2,
            max_df: 0.95,
            max_features: 80_000,
            sublinear_tf: true,
        }
    }

    /// Character n-grams 3-5, 20k terms.
    pub fn character() -> Self {
        VectorizerConfig {
            ngram_min: 3,
            ngram_max: 5,
            min_df: 2,
            max_df: 0.95,
            max_features: 20_000,
            sublinear_tf: true,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(DetectorError::invalid_config(format!(
                "{name}: invalid n-gram range ({}, {})",
                self.ngram_min, self.ngram_max
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(DetectorError::invalid_config(format!(
                "{name}: max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(DetectorError::invalid_config(format!(
                "{name}: max_features must be positive"
            )));
        }
        Ok(())
    }
}

/// Feature extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Word-level vectorizer
    pub lexical: VectorizerConfig,
    /// Character-level vectorizer
    pub character: VectorizerConfig,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        FeaturesConfig {
            lexical: VectorizerConfig::lexical(),
            character: VectorizerConfig::character(),
        }
    }
}

/// Which classifier to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Logistic regression only
    Linear,
    /// Soft vote of logistic regression and random forest
    Ensemble,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Linear => write!(f, "LogisticRegression"),
            ModelKind::Ensemble => write!(f, "Ensemble (LR+RF)"),
        }
    }
}

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Inverse regularization strength
    pub c: f64,
    /// Solver iteration budget
    pub max_iter: usize,
    /// Stop when the relative max weight change drops below this
    pub tol: f64,
    /// Weight classes inversely to their frequency
    pub balanced_class_weight: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        LinearConfig {
            c: 0.3,
            max_iter: 1000,
            tol: 1e-4,
            balanced_class_weight: true,
        }
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Weight classes inversely to their frequency
    pub balanced_class_weight: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 200,
            max_depth: 20,
            min_samples_split: 5,
            balanced_class_weight: true,
        }
    }
}

/// Classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// "linear" or "ensemble"
    pub kind: ModelKind,
    /// Logistic regression settings
    pub linear: LinearConfig,
    /// Random forest settings (ensemble only)
    pub forest: ForestConfig,
    /// Soft-vote weights, `[linear, forest]`
    pub ensemble_weights: [f64; 2],
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            kind: ModelKind::Linear,
            linear: LinearConfig::default(),
            forest: ForestConfig::default(),
            ensemble_weights: [1.2, 1.0],
        }
    }
}

/// Minority oversampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Apply SMOTE to the training partition
    pub enabled: bool,
    /// Nearest minority neighbours to interpolate towards
    pub k_neighbors: usize,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        BalanceConfig {
            enabled: true,
            k_neighbors: 5,
        }
    }
}

/// Inference gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Probability a phishing prediction must exceed to be flagged
    pub threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Output paths configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Model artifact path
    pub model_path: String,
    /// Optional JSON evaluation report path
    pub report_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            model_path: "models/phishing_model.bin".to_string(),
            report_path: None,
        }
    }
}

/// Logging and warning policy, read once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub level: String,
    /// Warn when text handed to the normalizer looks like a URL or path
    pub markup_warnings: bool,
    /// Warn when the linear solver exhausts its iteration budget
    pub convergence_warnings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            markup_warnings: false,
            convergence_warnings: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// Returns `Ok(Config)` if successful, or an error if the file cannot be read,
    /// parsed, or holds out-of-range values.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is within its valid range.
    pub fn validate(&self) -> Result<()> {
        if !(self.data.test_size > 0.0 && self.data.test_size < 1.0) {
            return Err(DetectorError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.data.test_size
            )));
        }
        if !(self.data.sample_frac > 0.0 && self.data.sample_frac <= 1.0) {
            return Err(DetectorError::invalid_config(format!(
                "sample_frac must be in (0, 1], got {}",
                self.data.sample_frac
            )));
        }
        self.features.lexical.validate("lexical")?;
        self.features.character.validate("character")?;

        if self.model.linear.c <= 0.0 || self.model.linear.max_iter == 0 {
            return Err(DetectorError::invalid_config(
                "linear: c and max_iter must be positive",
            ));
        }
        if self.model.forest.n_trees == 0 || self.model.forest.max_depth == 0 {
            return Err(DetectorError::invalid_config(
                "forest: n_trees and max_depth must be positive",
            ));
        }
        if self.model.ensemble_weights.iter().any(|w| *w < 0.0)
            || self.model.ensemble_weights.iter().sum::<f64>() <= 0.0
        {
            return Err(DetectorError::invalid_config(
                "ensemble_weights must be non-negative with a positive sum",
            ));
        }
        if !(0.0..=1.0).contains(&self.gate.threshold) {
            return Err(DetectorError::invalid_config(format!(
                "gate threshold must be in [0, 1], got {}",
                self.gate.threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let config = Config::default();
        assert_eq!(config.data.test_size, 0.2);
        assert_eq!(config.data.seed, 42);
        assert_eq!(config.features.lexical.max_features, 80_000);
        assert_eq!(config.features.character.ngram_min, 3);
        assert_eq!(config.model.linear.c, 0.3);
        assert_eq!(config.model.forest.n_trees, 200);
        assert_eq!(config.model.ensemble_weights, [1.2, 1.0]);
        assert_eq!(config.balance.k_neighbors, 5);
        assert_eq!(config.gate.threshold, 0.73);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [model]
            kind = "ensemble"

            [balance]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.model.kind, ModelKind::Ensemble);
        assert!(!config.balance.enabled);
        assert_eq!(config.model.forest.max_depth, 20);
        assert_eq!(config.data.text_column, "Email Text");
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = Config::default();
        config.data.test_size = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.features.character.ngram_min = 6;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gate.threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
