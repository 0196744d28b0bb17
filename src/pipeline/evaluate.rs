//! Model evaluation and results reporting.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::data::{class_counts, Label};
use crate::error::Result;

/// 2x2 confusion matrix with phishing as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tally `(actual, predicted)` pairs.
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        let mut m = ConfusionMatrix::default();
        for (a, p) in actual.iter().zip(predicted) {
            match (a, p) {
                (Label::Safe, Label::Safe) => m.true_negative += 1,
                (Label::Safe, Label::Phishing) => m.false_positive += 1,
                (Label::Phishing, Label::Safe) => m.false_negative += 1,
                (Label::Phishing, Label::Phishing) => m.true_positive += 1,
            }
        }
        m
    }

    /// Rows are actual classes, columns predicted classes.
    pub fn matrix(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total().to_string().len();
        writeln!(
            f,
            "[[{:>w$} {:>w$}]",
            self.true_negative,
            self.false_positive,
            w = width
        )?;
        writeln!(
            f,
            " [{:>w$} {:>w$}]]",
            self.false_negative,
            self.true_positive,
            w = width
        )?;
        writeln!(f, "  TN: {}  FP: {}", self.true_negative, self.false_positive)?;
        write!(f, "  FN: {}  TP: {}", self.false_negative, self.true_positive)
    }
}

/// Precision, recall, F1 and support for one class or one average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro/weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Indexed by [`Label::index`]
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Compute the report from a confusion matrix. Undefined ratios are 0.
    pub fn from_confusion(m: &ConfusionMatrix) -> Self {
        let grid = m.matrix();
        let total = m.total();

        let classes = [0usize, 1].map(|c| {
            let tp = grid[c][c] as f64;
            let predicted = (grid[0][c] + grid[1][c]) as f64;
            let support = grid[c][0] + grid[c][1];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support as f64);
            ClassMetrics {
                precision,
                recall,
                f1: ratio(2.0 * precision * recall, precision + recall),
                support,
            }
        });

        let macro_avg = ClassMetrics {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };
        let weighted = |get: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| get(c) * c.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        ClassificationReport {
            classes,
            accuracy: ratio((m.true_negative + m.true_positive) as f64, total as f64),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for label in Label::ALL {
            let c = &self.classes[label.index()];
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label.name(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

/// Class counts of each partition, before and after balancing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    /// Training partition as split
    pub train: [usize; 2],
    /// Training partition fed to the classifier
    pub train_balanced: [usize; 2],
    /// Held-out test partition
    pub test: [usize; 2],
    /// Synthetic rows added by balancing
    pub synthetic: usize,
}

/// Everything the trainer measured on the held-out partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Classifier variant description
    pub model: String,
    /// `(block name, width)` of the composed feature row
    pub feature_blocks: Vec<(String, usize)>,
    pub partitions: PartitionSummary,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    /// Wall-clock training time in seconds
    pub train_seconds: f64,
}

impl EvaluationReport {
    /// Build a report from test-set ground truth and predictions.
    pub fn new(
        model: String,
        feature_blocks: Vec<(String, usize)>,
        partitions: PartitionSummary,
        actual: &[Label],
        predicted: &[Label],
        train_seconds: f64,
    ) -> Self {
        let confusion = ConfusionMatrix::from_predictions(actual, predicted);
        EvaluationReport {
            model,
            feature_blocks,
            partitions,
            report: ClassificationReport::from_confusion(&confusion),
            confusion,
            train_seconds,
        }
    }

    /// Print the classification report and confusion matrix to stdout.
    pub fn print(&self) {
        println!("===================================================================\n");
        println!("Evaluation ({})\n", self.model);
        println!("Partitions:");
        print_counts("  Train", self.partitions.train);
        if self.partitions.synthetic > 0 {
            print_counts("  Train (balanced)", self.partitions.train_balanced);
        }
        print_counts("  Test", self.partitions.test);
        println!("\nTraining time: {:.2}s\n", self.train_seconds);
        println!("Classification Report:\n");
        println!("{}", self.report);
        println!("Confusion Matrix:");
        println!("{}", self.confusion);
        println!("\n===================================================================\n");
    }

    /// Write the report as pretty JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        println!("✓ Evaluation report saved to {}", path.display());
        Ok(())
    }
}

/// Print a class distribution with proportions.
pub fn print_counts(title: &str, counts: [usize; 2]) {
    let total = (counts[0] + counts[1]).max(1) as f64;
    println!(
        "{}: safe={} ({:.1}%), phishing={} ({:.1}%)",
        title,
        counts[0],
        counts[0] as f64 / total * 100.0,
        counts[1],
        counts[1] as f64 / total * 100.0
    );
}

/// Class counts of a label slice.
pub fn distribution(labels: &[Label]) -> [usize; 2] {
    class_counts(labels.iter().copied())
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}
