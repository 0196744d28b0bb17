//! Probabilistic classifiers over composed sparse rows.
//!
//! - [`LogisticRegression`] - L2-regularized, class-weighted linear model
//! - [`RandomForest`] - bagged CART trees, fitted in parallel
//! - [`SoftVotingEnsemble`] - weighted average of the two via [`soft_vote`]
//!
//! All of them implement [`ProbabilisticClassifier`]; [`Classifier`] is the
//! variant frozen into the trained artifact.

pub mod forest;
pub mod logistic;
pub mod voting;

use serde::{Deserialize, Serialize};

use super::config::{ModelConfig, ModelKind};
use super::data::{class_counts, Label};
use super::sparse::SparseVector;
use crate::error::{DetectorError, Result};

pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use voting::{soft_vote, SoftVotingEnsemble};

/// A model producing per-class probabilities `[p_safe, p_phishing]`.
pub trait ProbabilisticClassifier {
    fn predict_proba(&self, row: &SparseVector) -> [f64; 2];

    /// Argmax label (ties go to `Safe`) and the phishing probability.
    fn predict(&self, row: &SparseVector) -> (Label, f64) {
        let proba = self.predict_proba(row);
        (argmax(&proba), proba[Label::Phishing.index()])
    }
}

/// Label of the larger probability; ties resolve to `Safe`.
pub fn argmax(proba: &[f64; 2]) -> Label {
    if proba[1] > proba[0] {
        Label::Phishing
    } else {
        Label::Safe
    }
}

/// Per-class sample weights: `n / (2 * count_c)` when balanced, otherwise 1.
///
/// # Errors
///
/// Fails if either class is missing from `labels`.
pub fn class_weights(labels: &[Label], balanced: bool) -> Result<[f64; 2]> {
    let counts = class_counts(labels.iter().copied());
    if counts.iter().any(|&c| c == 0) {
        return Err(DetectorError::empty_dataset(format!(
            "classifier needs both classes, got safe={} phishing={}",
            counts[0], counts[1]
        )));
    }
    if !balanced {
        return Ok([1.0, 1.0]);
    }
    let n = labels.len() as f64;
    Ok([n / (2.0 * counts[0] as f64), n / (2.0 * counts[1] as f64)])
}

/// The fitted classifier stored in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    Linear(LogisticRegression),
    Ensemble(SoftVotingEnsemble),
}

impl Classifier {
    /// Fit the variant selected by `config.kind`.
    ///
    /// # Arguments
    ///
    /// * `rows` - composed training rows
    /// * `labels` - one label per row
    /// * `n_features` - composed width
    /// * `seed` - seed for the forest
    /// * `convergence_warnings` - log when the linear solver runs out of iterations
    pub fn fit(
        config: &ModelConfig,
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        seed: u64,
        convergence_warnings: bool,
    ) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(DetectorError::invalid_config(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        match config.kind {
            ModelKind::Linear => Ok(Classifier::Linear(LogisticRegression::fit(
                rows,
                labels,
                n_features,
                &config.linear,
                convergence_warnings,
            )?)),
            ModelKind::Ensemble => Ok(Classifier::Ensemble(SoftVotingEnsemble::fit(
                config,
                rows,
                labels,
                n_features,
                seed,
                convergence_warnings,
            )?)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::Linear(_) => ModelKind::Linear,
            Classifier::Ensemble(_) => ModelKind::Ensemble,
        }
    }
}

impl ProbabilisticClassifier for Classifier {
    fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        match self {
            Classifier::Linear(model) => model.predict_proba(row),
            Classifier::Ensemble(model) => model.predict_proba(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties_to_safe() {
        assert_eq!(argmax(&[0.5, 0.5]), Label::Safe);
        assert_eq!(argmax(&[0.4, 0.6]), Label::Phishing);
        assert_eq!(argmax(&[0.9, 0.1]), Label::Safe);
    }

    #[test]
    fn test_balanced_class_weights() {
        let mut labels = vec![Label::Safe; 6];
        labels.extend([Label::Phishing; 2]);
        let w = class_weights(&labels, true).unwrap();
        assert!((w[0] - 8.0 / 12.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);
        assert_eq!(class_weights(&labels, false).unwrap(), [1.0, 1.0]);
        assert!(class_weights(&[Label::Safe; 3], true).is_err());
    }
}
