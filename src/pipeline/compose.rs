//! Feature composition: ordered, named stages concatenated into one sparse row.
//!
//! Block layout of a composed row:
//!
//! ```text
//! [ numeric (9, standardized) | lexical (word TF-IDF) | character (char TF-IDF) ]
//! ```
//!
//! Every stage is fitted on the training partition only. Block offsets and the
//! total width are fixed by the fit and reused unchanged at inference.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::FeaturesConfig;
use super::normalize::TextNormalizer;
use super::scaler::StandardScaler;
use super::signals::{NumericFeatureVector, SignalExtractor, NUM_SIGNALS};
use super::sparse::SparseVector;
use super::tfidf::{Analyzer, TfidfVectorizer};
use crate::error::{DetectorError, Result};

/// One message after normalization and signal extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub numeric: NumericFeatureVector,
    /// Normalized text, never empty
    pub text: String,
}

impl FeatureRow {
    /// Normalize raw text, substitute the sentinel for empty results, then extract signals.
    pub fn from_raw(raw: &str, normalizer: &TextNormalizer, extractor: &SignalExtractor) -> Self {
        let text = normalizer.normalize_or_sentinel(raw);
        let numeric = extractor.extract(&text);
        FeatureRow { numeric, text }
    }
}

/// A fit/apply transformation producing one block of the composed row.
pub trait FeatureStage {
    /// Stage name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Learn stage parameters from training rows.
    fn fit(&mut self, rows: &[FeatureRow]) -> Result<()>;

    /// Transform one row into this stage's block (indices start at 0).
    fn apply(&self, row: &FeatureRow) -> Result<SparseVector>;

    /// Number of columns in this stage's block.
    fn width(&self) -> usize;

    fn is_fitted(&self) -> bool;
}

/// The built-in stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stage {
    /// Standardized numeric signals
    Numeric(Option<StandardScaler>),
    /// Word n-gram TF-IDF
    Lexical(TfidfVectorizer),
    /// Character n-gram TF-IDF
    Character(TfidfVectorizer),
}

impl FeatureStage for Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Numeric(_) => "numeric",
            Stage::Lexical(_) => "lexical",
            Stage::Character(_) => "character",
        }
    }

    fn fit(&mut self, rows: &[FeatureRow]) -> Result<()> {
        match self {
            Stage::Numeric(scaler) => {
                let numeric: Vec<[f64; NUM_SIGNALS]> =
                    rows.iter().map(|r| r.numeric.to_array()).collect();
                *scaler = Some(StandardScaler::fit(&numeric)?);
            }
            Stage::Lexical(vectorizer) | Stage::Character(vectorizer) => {
                let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
                vectorizer.fit(&texts)?;
            }
        }
        Ok(())
    }

    fn apply(&self, row: &FeatureRow) -> Result<SparseVector> {
        if !self.is_fitted() {
            return Err(DetectorError::NotFitted(self.name()));
        }
        Ok(match self {
            Stage::Numeric(Some(scaler)) => {
                SparseVector::from_dense(&scaler.transform(&row.numeric.to_array()))
            }
            Stage::Numeric(None) => SparseVector::new(),
            Stage::Lexical(vectorizer) | Stage::Character(vectorizer) => {
                vectorizer.transform(&row.text)
            }
        })
    }

    fn width(&self) -> usize {
        match self {
            Stage::Numeric(_) => NUM_SIGNALS,
            Stage::Lexical(vectorizer) | Stage::Character(vectorizer) => {
                vectorizer.vocabulary_size()
            }
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Stage::Numeric(scaler) => scaler.is_some(),
            Stage::Lexical(vectorizer) | Stage::Character(vectorizer) => vectorizer.is_fitted(),
        }
    }
}

/// Ordered list of stages whose outputs are concatenated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureComposer {
    stages: Vec<Stage>,
}

impl FeatureComposer {
    /// Unfitted composer with the numeric, lexical and character stages, in that order.
    pub fn new(config: &FeaturesConfig) -> Self {
        FeatureComposer {
            stages: vec![
                Stage::Numeric(None),
                Stage::Lexical(TfidfVectorizer::new(Analyzer::Word, config.lexical.clone())),
                Stage::Character(TfidfVectorizer::new(
                    Analyzer::Char,
                    config.character.clone(),
                )),
            ],
        }
    }

    /// Fit every stage, in order, on the training rows.
    pub fn fit(&mut self, rows: &[FeatureRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(DetectorError::empty_dataset("no training rows to fit features on"));
        }
        for stage in &mut self.stages {
            stage.fit(rows)?;
            log::info!("Fitted {} stage: {} columns", stage.name(), stage.width());
        }
        Ok(())
    }

    /// Compose one row.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::NotFitted`] if any stage has not been fitted.
    pub fn compose(&self, row: &FeatureRow) -> Result<SparseVector> {
        let mut blocks = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            blocks.push((stage.apply(row)?, stage.width()));
        }
        Ok(SparseVector::concat(&blocks))
    }

    /// Compose many rows in parallel, preserving order.
    pub fn compose_all(&self, rows: &[FeatureRow]) -> Result<Vec<SparseVector>> {
        rows.par_iter().map(|row| self.compose(row)).collect()
    }

    /// Total composed width.
    pub fn width(&self) -> usize {
        self.stages.iter().map(|s| s.width()).sum()
    }

    /// `(name, width)` of each block, in column order.
    pub fn blocks(&self) -> Vec<(&'static str, usize)> {
        self.stages.iter().map(|s| (s.name(), s.width())).collect()
    }

    pub fn is_fitted(&self) -> bool {
        self.stages.iter().all(|s| s.is_fitted())
    }

    /// Rebuild caches skipped by serialization.
    pub(crate) fn warm(&mut self) {
        for stage in &mut self.stages {
            if let Stage::Lexical(v) | Stage::Character(v) = stage {
                v.warm();
            }
        }
    }
}
