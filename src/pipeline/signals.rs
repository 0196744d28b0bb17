//! Numeric phishing indicators derived from normalized message text.
//!
//! Nine fixed-order signals:
//! 1. url_count - `http://`, `https://` or `www.` occurrences
//! 2. email_count - `local@domain.tld` tokens
//! 3. phone_count - runs of 8+ digits/separators, optional leading `+`
//! 4. exclamation_count
//! 5. question_count
//! 6. dollar_count
//! 7. digit_ratio - digits / max(length, 1)
//! 8. upper_ratio - ASCII uppercase letters / max(length, 1)
//! 9. word_count - whitespace-delimited tokens

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of numeric signals.
pub const NUM_SIGNALS: usize = 9;

/// Signal names in vector order.
pub const SIGNAL_NAMES: [&str; NUM_SIGNALS] = [
    "url_count",
    "email_count",
    "phone_count",
    "exclamation_count",
    "question_count",
    "dollar_count",
    "digit_ratio",
    "upper_ratio",
    "word_count",
];

/// Fixed-order numeric indicators for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericFeatureVector {
    pub url_count: f64,
    pub email_count: f64,
    pub phone_count: f64,
    pub exclamation_count: f64,
    pub question_count: f64,
    pub dollar_count: f64,
    pub digit_ratio: f64,
    pub upper_ratio: f64,
    pub word_count: f64,
}

impl NumericFeatureVector {
    /// Values in [`SIGNAL_NAMES`] order.
    pub fn to_array(&self) -> [f64; NUM_SIGNALS] {
        [
            self.url_count,
            self.email_count,
            self.phone_count,
            self.exclamation_count,
            self.question_count,
            self.dollar_count,
            self.digit_ratio,
            self.upper_ratio,
            self.word_count,
        ]
    }

    /// Values keyed by signal name, for debugging and reports.
    pub fn named(&self) -> HashMap<&'static str, f64> {
        SIGNAL_NAMES
            .iter()
            .copied()
            .zip(self.to_array())
            .collect()
    }
}

/// Regex-based extractor for [`NumericFeatureVector`].
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    url_regex: Regex,
    email_regex: Regex,
    phone_regex: Regex,
    digit_regex: Regex,
}

impl SignalExtractor {
    pub fn new() -> Self {
        SignalExtractor {
            url_regex: Regex::new(r"https?://|www\.").expect("url pattern is valid"),
            email_regex: Regex::new(r"\b[\w.-]+@[\w.-]+\.\w+\b").expect("email pattern is valid"),
            phone_regex: Regex::new(r"\+?\d[\d\s\-()]{7,}\d").expect("phone pattern is valid"),
            digit_regex: Regex::new(r"\d").expect("digit pattern is valid"),
        }
    }

    /// Extract all nine signals from already-normalized text.
    pub fn extract(&self, text: &str) -> NumericFeatureVector {
        if text.is_empty() {
            return NumericFeatureVector::default();
        }

        let mut length = 0usize;
        let mut uppers = 0usize;
        let mut exclamations = 0usize;
        let mut questions = 0usize;
        let mut dollars = 0usize;
        for c in text.chars() {
            length += 1;
            match c {
                'A'..='Z' => uppers += 1,
                '!' => exclamations += 1,
                '?' => questions += 1,
                '$' => dollars += 1,
                _ => {}
            }
        }
        let length = length.max(1) as f64;
        let digits = self.digit_regex.find_iter(text).count();

        NumericFeatureVector {
            url_count: self.url_regex.find_iter(text).count() as f64,
            email_count: self.email_regex.find_iter(text).count() as f64,
            phone_count: self.phone_regex.find_iter(text).count() as f64,
            exclamation_count: exclamations as f64,
            question_count: questions as f64,
            dollar_count: dollars as f64,
            digit_ratio: digits as f64 / length,
            upper_ratio: uppers as f64 / length,
            word_count: text.split_whitespace().count() as f64,
        }
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}
