//! Phishing Message Classification Pipeline
//!
//! This module implements the offline-trained pipeline behind [`crate::api::Predictor`]:
//!
//! - **Text normalization**: markup stripped, entities decoded, whitespace collapsed
//! - **Numeric signals**: nine counts and ratios (URLs, emails, phone numbers,
//!   punctuation, digits, uppercase, words)
//! - **TF-IDF** at two granularities: word n-grams (1-3) and character n-grams (3-5)
//! - **SMOTE** minority oversampling, training only
//! - **Classifiers**: logistic regression, or a soft-voting ensemble of logistic
//!   regression and a random forest
//!
//! ## Architecture
//!
//! ```text
//! raw text -> normalize -> { signals, word TF-IDF, char TF-IDF } -> compose
//!          -> [SMOTE, training only] -> classifier -> probability -> gate
//! ```
//!
//! Composed rows are sparse: `[9 numeric | <= 80k word terms | <= 20k char terms]`.
//!
//! ## Usage
//!
//! ### Training
//!
//! ```bash
//! # Logistic regression with SMOTE (default)
//! phishing-detector train --input data/Phishing_Email.csv
//!
//! # Ensemble, no balancing, quick run on a quarter of the data
//! phishing-detector train --ensemble --no-smote --sample-frac 0.25
//! ```
//!
//! ### Prediction
//!
//! ```bash
//! phishing-detector predict "Your account is locked. Verify at http://x.example"
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use phishing_detector::pipeline::config::Config;
//! use phishing_detector::pipeline::data::load_examples;
//! use phishing_detector::pipeline::train::train;
//!
//! let config = Config::default();
//! let dataset = load_examples("data/Phishing_Email.csv", "Email Text", "Email Type")?;
//! let (model, report) = train(dataset.examples, &config)?;
//! report.print();
//! # Ok::<(), phishing_detector::DetectorError>(())
//! ```
//!
//! ## Configuration
//!
//! Create a `config.toml` file to customize the pipeline; every section is optional:
//!
//! ```toml
//! [data]
//! csv_path = "data/Phishing_Email.csv"
//! test_size = 0.2
//! seed = 42
//!
//! [model]
//! kind = "linear"  # or "ensemble"
//!
//! [balance]
//! enabled = true
//! k_neighbors = 5
//!
//! [gate]
//! threshold = 0.73
//! ```
//!
//! ## Module Structure
//!
//! - [`config`] - Configuration structures and loading
//! - [`data`] - Labels, CSV loading, sampling and stratified splitting
//! - [`normalize`] - Markup stripping
//! - [`signals`] - Numeric signal extraction
//! - [`tfidf`] - TF-IDF vectorizer (word and character analyzers)
//! - [`scaler`] - Numeric standardization
//! - [`sparse`] - Sparse row type
//! - [`compose`] - Ordered feature stages
//! - [`balance`] - SMOTE oversampling
//! - [`classifier`] - Logistic regression, random forest, soft voting
//! - [`train`] - Training pipeline
//! - [`evaluate`] - Metrics and reports
//! - [`save`] - Model artifact persistence
//! - [`predict`] - Command-line prediction output
//! - `cli` - Command-line interface (`cli` feature)

pub mod balance;
pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod config;
pub mod data;
pub mod evaluate;
pub mod normalize;
pub mod predict;
pub mod save;
pub mod scaler;
pub mod signals;
pub mod sparse;
pub mod tfidf;
pub mod train;
