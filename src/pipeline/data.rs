//! Dataset records, CSV loading, and seeded splitting.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Binary class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Legitimate message (0)
    Safe = 0,
    /// Phishing message (1)
    Phishing = 1,
}

impl Label {
    /// Both labels, in index order.
    pub const ALL: [Label; 2] = [Label::Safe, Label::Phishing];

    /// Derive the label from a categorical string such as "Phishing Email" or "Safe Email".
    pub fn from_category(category: &str) -> Self {
        if category.to_lowercase().contains("phishing") {
            Label::Phishing
        } else {
            Label::Safe
        }
    }

    /// Column index of this class (0 or 1).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Report name of the class.
    pub fn name(self) -> &'static str {
        match self {
            Label::Safe => "safe",
            Label::Phishing => "phishing",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single training message with its binary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Raw message text (may contain markup)
    pub text: String,
    /// Ground-truth class
    pub label: Label,
}

impl LabeledExample {
    /// Build an example from raw text and a categorical label string.
    pub fn new(text: impl Into<String>, category: &str) -> Self {
        LabeledExample {
            text: text.into(),
            label: Label::from_category(category),
        }
    }
}

/// Examples loaded from disk plus the shape of the source table.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Complete rows, in file order
    pub examples: Vec<LabeledExample>,
    /// Number of header columns in the source file
    pub n_columns: usize,
    /// Rows dropped because text or label was missing
    pub dropped: usize,
}

impl Dataset {
    /// Per-class counts, indexed by [`Label::index`].
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(self.examples.iter().map(|e| e.label))
    }
}

/// Count labels, indexed by [`Label::index`].
pub fn class_counts(labels: impl IntoIterator<Item = Label>) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for label in labels {
        counts[label.index()] += 1;
    }
    counts
}

/// Load labeled examples from a CSV file with a header row.
///
/// # Arguments
///
/// * `path` - CSV file path
/// * `text_column` - header of the message text column
/// * `label_column` - header of the categorical label column
///
/// # Errors
///
/// Fails if the file cannot be read, a required column is missing, or the CSV is
/// malformed. Rows where either field is absent or empty are dropped, not errors.
pub fn load_examples<P: AsRef<Path>>(
    path: P,
    text_column: &str,
    label_column: &str,
) -> Result<Dataset> {
    let file = File::open(path.as_ref())?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DetectorError::MissingColumn(name.to_string()))
    };
    let text_idx = find(text_column)?;
    let label_idx = find(label_column)?;

    let mut examples = Vec::new();
    let mut dropped = 0;
    for record in reader.records() {
        let record = record?;
        match (record.get(text_idx), record.get(label_idx)) {
            (Some(text), Some(category)) if !text.is_empty() && !category.trim().is_empty() => {
                examples.push(LabeledExample::new(text, category));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::info!("Dropped {} rows with missing text or label", dropped);
    }

    Ok(Dataset {
        examples,
        n_columns: headers.len(),
        dropped,
    })
}

/// Keep a seeded random fraction of `items` (1.0 keeps everything, in order).
pub fn sample_fraction<T>(items: Vec<T>, fraction: f64, seed: u64) -> Vec<T> {
    if fraction >= 1.0 {
        return items;
    }
    let keep = ((items.len() as f64) * fraction).round() as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indexed: Vec<(usize, T)> = items.into_iter().enumerate().collect();
    indexed.shuffle(&mut rng);
    indexed.truncate(keep);
    indexed.into_iter().map(|(_, item)| item).collect()
}

/// Stratified train/test split of row indices.
///
/// Each class is shuffled with the seeded RNG and `round(test_size * class_count)`
/// of its rows go to the test side (at least one and never all, when the class has
/// two or more rows). Returned index lists are sorted.
///
/// # Errors
///
/// Fails if either class is absent; a single-class dataset cannot be stratified.
pub fn stratified_split(
    labels: &[Label],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let counts = class_counts(labels.iter().copied());
    if counts.iter().any(|&c| c == 0) {
        return Err(DetectorError::empty_dataset(format!(
            "stratified split needs both classes, got safe={} phishing={}",
            counts[0], counts[1]
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for label in Label::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == label)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n = members.len();
        let mut n_test = ((n as f64) * test_size).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        } else {
            n_test = 0;
        }

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_label_from_category() {
        assert_eq!(Label::from_category("Phishing Email"), Label::Phishing);
        assert_eq!(Label::from_category("PHISHING"), Label::Phishing);
        assert_eq!(Label::from_category("Safe Email"), Label::Safe);
        assert_eq!(Label::from_category("spam"), Label::Safe);
    }

    #[test]
    fn test_load_examples_drops_incomplete_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ",Email Text,Email Type").unwrap();
        writeln!(file, "0,hello there,Safe Email").unwrap();
        writeln!(file, "1,verify your account,Phishing Email").unwrap();
        writeln!(file, "2,,Safe Email").unwrap();
        writeln!(file, "3,no label here,").unwrap();

        let dataset = load_examples(file.path(), "Email Text", "Email Type").unwrap();
        assert_eq!(dataset.examples.len(), 2);
        assert_eq!(dataset.dropped, 2);
        assert_eq!(dataset.n_columns, 3);
        assert_eq!(dataset.class_counts(), [1, 1]);
    }

    #[test]
    fn test_load_examples_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "body,kind").unwrap();
        writeln!(file, "hello,Safe Email").unwrap();

        let err = load_examples(file.path(), "Email Text", "Email Type").unwrap_err();
        assert!(matches!(err, DetectorError::MissingColumn(ref c) if c == "Email Text"));
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        let mut labels = vec![Label::Safe; 80];
        labels.extend(vec![Label::Phishing; 20]);

        let (train, test) = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(train.len() + test.len(), 100);

        let test_counts = class_counts(test.iter().map(|&i| labels[i]));
        assert_eq!(test_counts, [16, 4]);

        let again = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(again, (train, test));
    }

    #[test]
    fn test_stratified_split_single_class_fails() {
        let labels = vec![Label::Safe; 10];
        assert!(stratified_split(&labels, 0.2, 42).is_err());
    }

    #[test]
    fn test_sample_fraction() {
        let items: Vec<usize> = (0..100).collect();
        let sampled = sample_fraction(items.clone(), 0.25, 7);
        assert_eq!(sampled.len(), 25);
        assert_eq!(sampled, sample_fraction(items.clone(), 0.25, 7));
        assert_eq!(sample_fraction(items.clone(), 1.0, 7), items);
    }
}
