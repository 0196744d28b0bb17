//! Model training pipeline for the phishing classifier.

use std::time::Instant;

use rayon::prelude::*;

use super::balance::{BalancedSet, Balancer, PipelineMode};
use super::classifier::{Classifier, ProbabilisticClassifier};
use super::compose::{FeatureComposer, FeatureRow};
use super::config::Config;
use super::data::{load_examples, sample_fraction, stratified_split, Label, LabeledExample};
use super::evaluate::{distribution, print_counts, EvaluationReport, PartitionSummary};
use super::normalize::TextNormalizer;
use super::save::{save_model, TrainedModel, TrainingMetadata};
use super::signals::SignalExtractor;
use crate::error::{DetectorError, Result};

/// Fit the full pipeline and evaluate it on a held-out partition.
///
/// Steps:
/// 1. Optional seeded sub-sampling (`data.sample_frac`)
/// 2. Normalize text, substitute the empty sentinel, extract numeric signals
/// 3. Stratified train/test split
/// 4. Fit the feature composer on the training partition, compose both partitions
/// 5. Optionally balance the training partition with SMOTE
/// 6. Fit the classifier
/// 7. Evaluate on the untouched test partition
///
/// Every randomized step uses `data.seed`, so identical data and configuration
/// reproduce identical results.
///
/// # Errors
///
/// Fails on an empty or single-class dataset, or when a vectorizer keeps no terms.
pub fn train(
    examples: Vec<LabeledExample>,
    config: &Config,
) -> Result<(TrainedModel, EvaluationReport)> {
    let start = Instant::now();
    let seed = config.data.seed;

    let examples = sample_fraction(examples, config.data.sample_frac, seed);
    if examples.is_empty() {
        return Err(DetectorError::empty_dataset("no examples to train on"));
    }

    let normalizer = TextNormalizer::new(config.logging.markup_warnings);
    let extractor = SignalExtractor::new();
    let rows: Vec<FeatureRow> = examples
        .par_iter()
        .map(|e| FeatureRow::from_raw(&e.text, &normalizer, &extractor))
        .collect();
    let labels: Vec<Label> = examples.iter().map(|e| e.label).collect();
    log::info!("Prepared {} feature rows", rows.len());

    let (train_idx, test_idx) = stratified_split(&labels, config.data.test_size, seed)?;
    let pick_rows = |idx: &[usize]| idx.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
    let pick_labels = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<_>>();
    let train_rows = pick_rows(&train_idx);
    let test_rows = pick_rows(&test_idx);
    let train_labels = pick_labels(&train_idx);
    let test_labels = pick_labels(&test_idx);

    let mut composer = FeatureComposer::new(&config.features);
    composer.fit(&train_rows)?;
    let train_x = composer.compose_all(&train_rows)?;
    let test_x = composer.compose_all(&test_rows)?;
    let n_features = composer.width();

    let train_counts = distribution(&train_labels);
    let balanced = if config.balance.enabled {
        Balancer::new(config.balance.k_neighbors, seed).balance(
            PipelineMode::Training,
            train_x,
            train_labels,
        )?
    } else {
        log::info!("Balancing disabled");
        BalancedSet {
            rows: train_x,
            labels: train_labels,
            synthetic: 0,
        }
    };

    log::info!(
        "Fitting {} on {} rows x {} features",
        config.model.kind,
        balanced.rows.len(),
        n_features
    );
    let classifier = Classifier::fit(
        &config.model,
        &balanced.rows,
        &balanced.labels,
        n_features,
        seed,
        config.logging.convergence_warnings,
    )?;

    let predicted: Vec<Label> = test_x
        .par_iter()
        .map(|row| classifier.predict(row).0)
        .collect();

    let partitions = PartitionSummary {
        train: train_counts,
        train_balanced: balanced.class_counts(),
        test: distribution(&test_labels),
        synthetic: balanced.synthetic,
    };
    let report = EvaluationReport::new(
        config.model.kind.to_string(),
        composer
            .blocks()
            .into_iter()
            .map(|(name, width)| (name.to_string(), width))
            .collect(),
        partitions,
        &test_labels,
        &predicted,
        start.elapsed().as_secs_f64(),
    );

    let metadata = TrainingMetadata {
        model_kind: classifier.kind(),
        n_features,
        n_train: balanced.rows.len(),
        seed,
        balanced: balanced.synthetic > 0,
        test_accuracy: report.report.accuracy,
    };

    Ok((TrainedModel::new(composer, classifier, metadata), report))
}

/// Load the dataset named in `config`, train, report, and save the artifact.
///
/// This is the `train` command: it prints the dataset shape and class
/// distribution, the classification report and the confusion matrix, then
/// writes the model (and optionally a JSON report).
pub fn train_model(config: &Config) -> Result<()> {
    print_training_header(config);

    println!("Loading dataset...");
    let start = Instant::now();
    let dataset = load_examples(
        &config.data.csv_path,
        &config.data.text_column,
        &config.data.label_column,
    )?;
    println!(
        "  Dataset shape: ({}, {}) ({:.2}s)",
        dataset.examples.len(),
        dataset.n_columns,
        start.elapsed().as_secs_f64()
    );
    if dataset.dropped > 0 {
        println!("  Dropped {} incomplete rows", dataset.dropped);
    }
    print_counts("  Class distribution", dataset.class_counts());
    println!();

    let (model, report) = train(dataset.examples, config)?;
    report.print();

    save_model(&model, &config.output.model_path)?;
    println!("✓ Model saved to {}", config.output.model_path);
    if let Some(path) = &config.output.report_path {
        report.save_json(path)?;
    }

    println!("\nTraining complete!\n");
    println!("To predict: phishing-detector predict \"your message here\"\n");
    Ok(())
}

/// Print training header with configuration details.
fn print_training_header(config: &Config) {
    println!("\n===================================================================");
    println!("  Phishing Detector: TF-IDF + Numeric Signals");
    println!("===================================================================\n");

    println!("Configuration:");
    println!("  Data: {}", config.data.csv_path);
    println!(
        "  Train/Test split: {:.0}%/{:.0}%",
        (1.0 - config.data.test_size) * 100.0,
        config.data.test_size * 100.0
    );
    if config.data.sample_frac < 1.0 {
        println!("  Sample fraction: {}", config.data.sample_frac);
    }
    println!(
        "  Word n-grams: {}-{} (max {} terms)",
        config.features.lexical.ngram_min,
        config.features.lexical.ngram_max,
        config.features.lexical.max_features
    );
    println!(
        "  Char n-grams: {}-{} (max {} terms)",
        config.features.character.ngram_min,
        config.features.character.ngram_max,
        config.features.character.max_features
    );
    println!("  Model: {}", config.model.kind);
    println!(
        "  SMOTE: {}",
        if config.balance.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("  Seed: {}\n", config.data.seed);
    println!("===================================================================\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ModelKind;

    fn corpus() -> Vec<LabeledExample> {
        let phishing = [
            "URGENT: verify your account now at http://secure-login.example.com!!!",
            "Your password expires today, click http://reset.example.net to keep access",
            "You won $1000! Claim your prize at www.prize-claim.biz now!",
            "Account suspended. Confirm your bank details at http://bank-verify.example.org",
        ];
        let safe = [
            "Hi team, the meeting moved to 3pm tomorrow in room B.",
            "Attached are the notes from yesterday's planning session.",
            "Can you review the quarterly report draft before Friday?",
            "Lunch on Thursday? The new place near the office looks good.",
            "Reminder: please submit your timesheets by end of day.",
            "Thanks for the update, I will follow up with the vendor.",
        ];
        let mut examples = Vec::new();
        for round in 0..4 {
            for text in phishing {
                examples.push(LabeledExample::new(format!("{text} ref {round}"), "Phishing Email"));
            }
            for text in safe {
                examples.push(LabeledExample::new(format!("{text} ref {round}"), "Safe Email"));
            }
        }
        examples
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.model.forest.n_trees = 10;
        config.features.lexical.max_df = 1.0;
        config.features.character.max_df = 1.0;
        config
    }

    #[test]
    fn test_train_reports_partitions() {
        let (model, report) = train(corpus(), &small_config()).unwrap();

        assert_eq!(report.partitions.train, [19, 13]);
        assert_eq!(report.partitions.test, [5, 3]);
        assert_eq!(report.partitions.train_balanced, [19, 19]);
        assert_eq!(report.partitions.synthetic, 6);
        assert_eq!(report.confusion.total(), 8);
        assert_eq!(model.metadata.n_train, 38);
        assert_eq!(model.metadata.n_features, model.composer.width());
    }

    #[test]
    fn test_balancing_leaves_test_partition_alone() {
        let mut config = small_config();
        let (_, with_smote) = train(corpus(), &config).unwrap();
        config.balance.enabled = false;
        let (_, without) = train(corpus(), &config).unwrap();

        assert_eq!(with_smote.partitions.test, without.partitions.test);
        assert_eq!(without.partitions.train, without.partitions.train_balanced);
        assert_eq!(without.partitions.synthetic, 0);
    }

    #[test]
    fn test_ensemble_training() {
        let mut config = small_config();
        config.model.kind = ModelKind::Ensemble;
        let (model, report) = train(corpus(), &config).unwrap();
        assert_eq!(model.classifier.kind(), ModelKind::Ensemble);
        assert_eq!(report.model, "Ensemble (LR+RF)");
    }

    #[test]
    fn test_single_class_fails() {
        let examples: Vec<_> = corpus()
            .into_iter()
            .filter(|e| e.label == Label::Safe)
            .collect();
        assert!(train(examples, &small_config()).is_err());
    }
}
