//! TF-IDF (Term Frequency-Inverse Document Frequency) vectorizer implementation.
//!
//! One vectorizer type serves both text granularities:
//!
//! - [`Analyzer::Word`]: accent-folded, lowercased word tokens (two or more word
//!   characters) and their n-grams, joined by a space
//! - [`Analyzer::Char`]: lowercased, whitespace-collapsed text cut into
//!   overlapping character n-grams
//!
//! Fitting keeps terms whose document frequency lies in `[min_df, max_df * n]`,
//! caps the vocabulary at the `max_features` most frequent terms, and computes a
//! smoothed IDF. Transforming applies (optionally sublinear) TF, IDF and L2
//! normalization. Out-of-vocabulary terms are ignored.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::config::VectorizerConfig;
use super::sparse::SparseVector;
use crate::error::{DetectorError, Result};

/// How documents are cut into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Analyzer {
    /// Word n-grams
    Word,
    /// Character n-grams
    Char,
}

/// TF-IDF vectorizer for converting text to sparse numerical features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    analyzer: Analyzer,
    params: VectorizerConfig,
    /// Term to column index mapping (indices follow lexicographic term order)
    vocabulary: HashMap<String, u32>,
    /// Inverse document frequency per column
    idf: Vec<f64>,
    /// Number of documents seen by `fit`
    n_documents: usize,
    #[serde(skip)]
    token_regex: Option<Regex>,
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    ///
    /// # Arguments
    ///
    /// * `analyzer` - word or character n-grams
    /// * `params` - n-gram range, document frequency bounds, vocabulary cap, TF scaling
    pub fn new(analyzer: Analyzer, params: VectorizerConfig) -> Self {
        TfidfVectorizer {
            analyzer,
            params,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
            token_regex: None,
        }
    }

    /// Fit the vectorizer on a collection of documents.
    ///
    /// This builds the vocabulary and calculates IDF values.
    ///
    /// # Errors
    ///
    /// Fails when there are no documents, when `max_df` admits fewer documents than
    /// `min_df`, or when no term survives pruning.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        let n_docs = documents.len();
        if n_docs == 0 {
            return Err(DetectorError::vectorizer("cannot fit on zero documents"));
        }
        let max_doc_count = self.params.max_df * n_docs as f64;
        if max_doc_count < self.params.min_df as f64 {
            return Err(DetectorError::vectorizer(format!(
                "max_df={} corresponds to fewer documents than min_df={}",
                self.params.max_df, self.params.min_df
            )));
        }

        let regex = self.regex();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut corpus_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.analyze(doc.as_ref(), &regex);
            let mut seen: HashSet<&str> = HashSet::with_capacity(terms.len());
            for term in &terms {
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
            for term in terms {
                *corpus_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = corpus_freq
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq.get(term).copied().unwrap_or(0);
                df >= self.params.min_df && (df as f64) <= max_doc_count
            })
            .collect();
        if kept.is_empty() {
            return Err(DetectorError::vectorizer(format!(
                "{:?} analyzer: no terms remain after pruning; try a lower min_df or a higher max_df",
                self.analyzer
            )));
        }

        // Select top max_features by corpus frequency, then index alphabetically
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(self.params.max_features);
        let mut terms: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n = n_docs as f64;
        self.idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx as u32))
            .collect();
        self.n_documents = n_docs;
        self.token_regex = Some(regex);

        log::debug!(
            "{:?} vectorizer fitted: {} documents, {} terms",
            self.analyzer,
            n_docs,
            self.vocabulary.len()
        );
        Ok(())
    }

    /// Transform a document into an L2-normalized TF-IDF sparse vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let terms = match &self.token_regex {
            Some(regex) => self.analyze(document, regex),
            None => self.analyze(document, &self.regex()),
        };

        let mut counts: HashMap<u32, usize> = HashMap::new();
        for term in &terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(idx, count)| {
                let tf = if self.params.sublinear_tf {
                    1.0 + (count as f64).ln()
                } else {
                    count as f64
                };
                (idx, tf * self.idf[idx as usize])
            })
            .collect();

        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        vector
    }

    /// Number of columns this vectorizer produces.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Column index of `term`, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|idx| self.idf[idx as usize])
    }

    /// Cut a document into terms according to the analyzer.
    pub fn analyze(&self, document: &str, token_regex: &Regex) -> Vec<String> {
        match self.analyzer {
            Analyzer::Word => {
                let folded = fold_accents(document).to_lowercase();
                let tokens: Vec<&str> = token_regex.find_iter(&folded).map(|m| m.as_str()).collect();
                word_ngrams(&tokens, self.params.ngram_min, self.params.ngram_max)
            }
            Analyzer::Char => {
                let text = collapse_ws(&document.to_lowercase());
                char_ngrams(&text, self.params.ngram_min, self.params.ngram_max)
            }
        }
    }

    /// Tokenizer used by the word analyzer (ignored by the char analyzer).
    pub fn regex(&self) -> Regex {
        Regex::new(r"\b\w\w+\b").expect("token pattern is valid")
    }

    /// Restore cached state after deserialization.
    pub(crate) fn warm(&mut self) {
        if self.token_regex.is_none() {
            self.token_regex = Some(self.regex());
        }
    }
}

/// NFKD-decompose and drop combining marks ("café" -> "cafe").
pub fn fold_accents(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

fn collapse_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

fn word_ngrams(tokens: &[&str], min_n: usize, max_n: usize) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

fn char_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n > chars.len() {
            break;
        }
        for window in chars.windows(n) {
            terms.push(window.iter().collect());
        }
    }
    terms
}
