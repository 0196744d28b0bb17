//! High-level API for phishing message prediction
//!
//! This module provides a simple, user-friendly interface for loading a trained
//! model and classifying messages.
//!
//! # Quick Start
//!
//! ```no_run
//! use phishing_detector::api::Predictor;
//!
//! let predictor = Predictor::load("models/phishing_model.bin")?;
//! let result = predictor.predict("Verify your account at http://x.example now!!!");
//! println!("{} ({:.1}%)", result.label, result.probability * 100.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Examples
//!
//! ## Gated Decisions
//!
//! The raw probability is turned into an actionable flag by the inference gate.
//! The default threshold is 0.73; it can be overridden per deployment:
//!
//! ```no_run
//! # use phishing_detector::api::Predictor;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let predictor = Predictor::load("models/phishing_model.bin")?.with_threshold(0.9);
//! let assessment = predictor.assess("Your password expires today, click here");
//!
//! if assessment.decision.is_confident_phishing {
//!     println!("blocked");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Batch Predictions
//!
//! ```no_run
//! # use phishing_detector::api::Predictor;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let predictor = Predictor::load("models/phishing_model.bin")?;
//! let texts = vec!["Lunch at noon?", "You won $1000! Claim now"];
//! let results = predictor.predict_batch(&texts);
//!
//! for (text, result) in texts.iter().zip(results.iter()) {
//!     println!("{}: {}", text, result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing Across Threads
//!
//! `Predictor` is immutable after loading, so one instance can be wrapped in an
//! `Arc` and used from any number of threads without locking.
//!
//! ## Error Handling
//!
//! Only loading can fail. Prediction accepts any string, including empty or
//! markup-only input:
//!
//! ```no_run
//! use phishing_detector::api::Predictor;
//!
//! match Predictor::load("models/phishing_model.bin") {
//!     Ok(predictor) => {
//!         let result = predictor.predict("");
//!         println!("{}", result);
//!     }
//!     Err(e) => {
//!         eprintln!("Failed to load model: {}", e);
//!         eprintln!("Train one first: phishing-detector train");
//!     }
//! }
//! ```

use std::fmt;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gate::{Decision, InferenceGate};
use crate::pipeline::classifier::ProbabilisticClassifier;
use crate::pipeline::compose::FeatureRow;
use crate::pipeline::data::Label;
use crate::pipeline::normalize::TextNormalizer;
use crate::pipeline::save::{TrainedModel, TrainingMetadata};
use crate::pipeline::signals::SignalExtractor;
use crate::pipeline::sparse::SparseVector;

/// Main predictor interface for phishing classification
#[derive(Debug)]
pub struct Predictor {
    model: TrainedModel,
    normalizer: TextNormalizer,
    extractor: SignalExtractor,
    gate: InferenceGate,
}

/// Prediction result containing the label and phishing probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Argmax class (ties go to safe)
    pub label: Label,

    /// Probability of the phishing class (0.0 to 1.0)
    pub probability: f64,
}

/// A prediction together with its gated decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub prediction: PredictionResult,
    pub decision: Decision,
}

impl Predictor {
    /// Load a trained model from disk with the default gate threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, corrupted, or not a model artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_model(TrainedModel::load(path)?))
    }

    /// Wrap an in-memory model (e.g. straight out of training).
    pub fn from_model(model: TrainedModel) -> Self {
        Predictor {
            model,
            normalizer: TextNormalizer::default(),
            extractor: SignalExtractor::new(),
            gate: InferenceGate::default(),
        }
    }

    /// Replace the gate threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.gate = InferenceGate::new(threshold);
        self
    }

    /// Warn when inputs look like URLs or file paths instead of message text.
    pub fn with_markup_warnings(mut self, enabled: bool) -> Self {
        self.normalizer = TextNormalizer::new(enabled);
        self
    }

    pub fn markup_warnings(&self) -> bool {
        self.normalizer.warns_on_locator()
    }

    /// Predict whether a message is phishing
    ///
    /// # Arguments
    ///
    /// * `text` - Raw message text (plain text or HTML)
    ///
    /// # Returns
    ///
    /// A `PredictionResult`; this never fails for any input string.
    pub fn predict(&self, text: &str) -> PredictionResult {
        let row = FeatureRow::from_raw(text, &self.normalizer, &self.extractor);
        let features = self.model.composer.compose(&row).unwrap_or_else(|e| {
            log::error!("Feature composition failed: {}", e);
            SparseVector::new()
        });
        let (label, probability) = self.model.classifier.predict(&features);
        PredictionResult { label, probability }
    }

    /// Predict many messages in parallel, preserving input order.
    pub fn predict_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<PredictionResult> {
        texts.par_iter().map(|t| self.predict(t.as_ref())).collect()
    }

    /// Predict and apply the inference gate.
    pub fn assess(&self, text: &str) -> Assessment {
        let prediction = self.predict(text);
        Assessment {
            prediction,
            decision: self.gate.decide(&prediction),
        }
    }

    /// Apply the gate to an existing prediction.
    pub fn decide(&self, prediction: &PredictionResult) -> Decision {
        self.gate.decide(prediction)
    }

    pub fn threshold(&self) -> f64 {
        self.gate.threshold()
    }

    /// Facts recorded when the model was trained.
    pub fn model_info(&self) -> &TrainingMetadata {
        &self.model.metadata
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (phishing probability: {:.1}%)",
            self.label,
            self.probability * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_predictor_is_send_sync() {
        assert_send_sync::<Predictor>();
    }

    #[test]
    fn test_display() {
        let result = PredictionResult {
            label: Label::Phishing,
            probability: 0.912,
        };
        assert_eq!(result.to_string(), "phishing (phishing probability: 91.2%)");
    }
}
