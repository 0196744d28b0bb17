//! Inference-time decision rule.
//!
//! A prediction is only actionable when the classifier says phishing *and* the
//! phishing probability is strictly above a confidence threshold. The threshold is
//! a deployment setting, independent of the trained artifact.

use serde::{Deserialize, Serialize};

use crate::api::PredictionResult;
use crate::pipeline::data::Label;

/// Default probability a phishing prediction must exceed to be flagged.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.73;

/// Gated outcome of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub is_confident_phishing: bool,
}

/// Threshold check applied to every prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceGate {
    threshold: f64,
}

impl InferenceGate {
    pub fn new(threshold: f64) -> Self {
        InferenceGate { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, prediction: &PredictionResult) -> Decision {
        Decision {
            is_confident_phishing: prediction.label == Label::Phishing
                && prediction.probability > self.threshold,
        }
    }
}

impl Default for InferenceGate {
    fn default() -> Self {
        InferenceGate::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(label: Label, probability: f64) -> PredictionResult {
        PredictionResult { label, probability }
    }

    #[test]
    fn test_gate_decisions() {
        let gate = InferenceGate::default();
        assert!(gate.decide(&prediction(Label::Phishing, 0.80)).is_confident_phishing);
        assert!(!gate.decide(&prediction(Label::Phishing, 0.70)).is_confident_phishing);
        assert!(!gate.decide(&prediction(Label::Safe, 0.90)).is_confident_phishing);
    }

    #[test]
    fn test_threshold_is_strict() {
        let gate = InferenceGate::new(0.6);
        assert!(!gate.decide(&prediction(Label::Phishing, 0.6)).is_confident_phishing);
        assert!(gate.decide(&prediction(Label::Phishing, 0.61)).is_confident_phishing);
        assert_eq!(gate.threshold(), 0.6);
    }
}
