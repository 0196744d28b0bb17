//! Soft voting over probabilistic classifiers.

use serde::{Deserialize, Serialize};

use super::{LogisticRegression, ProbabilisticClassifier, RandomForest};
use crate::error::Result;
use crate::pipeline::config::ModelConfig;
use crate::pipeline::data::Label;
use crate::pipeline::sparse::SparseVector;

/// Weighted average of per-class probabilities.
///
/// `outputs[i]` is weighted by `weights[i]`; extra entries on either side are
/// ignored. A zero total weight yields `[0.5, 0.5]`.
pub fn soft_vote(outputs: &[[f64; 2]], weights: &[f64]) -> [f64; 2] {
    let mut sum = [0.0; 2];
    let mut total = 0.0;
    for (proba, &w) in outputs.iter().zip(weights) {
        sum[0] += w * proba[0];
        sum[1] += w * proba[1];
        total += w;
    }
    if total <= 0.0 {
        return [0.5, 0.5];
    }
    [sum[0] / total, sum[1] / total]
}

/// Logistic regression and random forest combined by [`soft_vote`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    pub linear: LogisticRegression,
    pub forest: RandomForest,
    /// `[linear, forest]`
    pub weights: [f64; 2],
}

impl SoftVotingEnsemble {
    /// Fit both members on the same rows; they train concurrently.
    pub fn fit(
        config: &ModelConfig,
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        seed: u64,
        convergence_warnings: bool,
    ) -> Result<Self> {
        let (linear, forest) = rayon::join(
            || {
                LogisticRegression::fit(
                    rows,
                    labels,
                    n_features,
                    &config.linear,
                    convergence_warnings,
                )
            },
            || RandomForest::fit(rows, labels, n_features, &config.forest, seed),
        );
        Ok(SoftVotingEnsemble {
            linear: linear?,
            forest: forest?,
            weights: config.ensemble_weights,
        })
    }
}

impl ProbabilisticClassifier for SoftVotingEnsemble {
    fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        soft_vote(
            &[self.linear.predict_proba(row), self.forest.predict_proba(row)],
            &self.weights,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ModelKind;

    #[test]
    fn test_soft_vote_weights() {
        let p = soft_vote(&[[0.2, 0.8], [0.6, 0.4]], &[1.2, 1.0]);
        // (1.2 * 0.8 + 0.4) / 2.2
        assert!((p[1] - 1.36 / 2.2).abs() < 1e-12);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_soft_vote_equal_weights_is_mean() {
        let p = soft_vote(&[[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]], &[1.0, 1.0, 1.0]);
        assert!((p[1] - 0.5).abs() < 1e-12);
        assert_eq!(soft_vote(&[[0.3, 0.7]], &[0.0]), [0.5, 0.5]);
    }

    #[test]
    fn test_ensemble_fit_and_predict() {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = (i % 4) as f64 * 0.1;
            rows.push(SparseVector::from_dense(&[1.0 + jitter, 0.0]));
            labels.push(Label::Phishing);
            rows.push(SparseVector::from_dense(&[0.0, 1.0 + jitter]));
            labels.push(Label::Safe);
        }
        let mut config = ModelConfig {
            kind: ModelKind::Ensemble,
            ..ModelConfig::default()
        };
        config.forest.n_trees = 10;

        let ensemble = SoftVotingEnsemble::fit(&config, &rows, &labels, 2, 42, false).unwrap();
        assert_eq!(ensemble.weights, [1.2, 1.0]);
        assert_eq!(ensemble.predict(&rows[0]).0, Label::Phishing);
        assert_eq!(ensemble.predict(&rows[1]).0, Label::Safe);
    }
}
