//! # Phishing Detector - Message Phishing Classifier
//!
//! Classifies short messages (email bodies, chat messages) as phishing or safe
//! and returns a calibrated phishing probability.
//!
//! ## Features
//!
//! - **Markup-aware**: HTML bodies are reduced to visible text before analysis
//! - **Dual-granularity TF-IDF**: word n-grams and character n-grams
//! - **Numeric signals**: URL, email, phone and punctuation counts, digit and
//!   uppercase ratios
//! - **Imbalance correction**: SMOTE oversampling during training
//! - **Ensemble-capable**: logistic regression alone, or soft-voted with a
//!   random forest trained in parallel
//! - **Inference gate**: a prediction is only flagged above a confidence threshold
//!
//! ## Quick Start
//!
//! ```no_run
//! use phishing_detector::api::Predictor;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let predictor = Predictor::load("models/phishing_model.bin")?;
//!
//!     let assessment = predictor.assess("URGENT: confirm your password at http://x.example");
//!     println!("{}", assessment.prediction);
//!     if assessment.decision.is_confident_phishing {
//!         println!("flagged");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Available Cargo Features
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `cli` | Include the `phishing-detector` binary | ✓ |
//!
//! ```toml
//! # Library only
//! phishing-detector = { version = "0.1", default-features = false }
//! ```
//!
//! ## Examples
//!
//! ```bash
//! cargo run --example simple
//! cargo run --example batch
//! ```

// Public API modules
pub mod api;
pub mod error;
pub mod gate;

// Training and feature pipeline
pub mod pipeline;

pub use api::{Assessment, PredictionResult, Predictor};
pub use error::{DetectorError, Result};
pub use gate::{Decision, InferenceGate, DEFAULT_CONFIDENCE_THRESHOLD};
pub use pipeline::config::Config;
pub use pipeline::data::{Label, LabeledExample};
pub use pipeline::save::TrainedModel;
pub use pipeline::train::train;
