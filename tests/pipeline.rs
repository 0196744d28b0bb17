//! End-to-end training, persistence and prediction on a small synthetic corpus.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use phishing_detector::pipeline::config::ModelKind;
use phishing_detector::pipeline::data::load_examples;
use phishing_detector::pipeline::predict::load_predictor;
use phishing_detector::pipeline::save::save_model;
use phishing_detector::{train, Config, Label, Predictor, TrainedModel};

const PHISHING: &[&str] = &[
    "URGENT: your account has been suspended. Verify now at http://secure-login.example.com!!!",
    "Your password expires today. Click http://reset-password.example.net to keep access",
    "Congratulations! You won $1000. Claim your prize at www.prize-claim.biz now!",
    "<html><body><p>Confirm your <b>bank details</b> at http://bank-verify.example.org</p></body></html>",
    "Final notice: unpaid invoice. Pay immediately at http://billing-update.example.com or call +1 555 010 2030",
];

const SAFE: &[&str] = &[
    "Hi team, the meeting moved to 3pm tomorrow in room B.",
    "Attached are the notes from yesterday's planning session.",
    "Can you review the quarterly report draft before Friday?",
    "Lunch on Thursday? The new place near the office looks good.",
    "Reminder: please submit your timesheets by end of day.",
    "Thanks for the update, I will follow up with the vendor next week.",
    "<p>The build is green again, nice work on the flaky test fix.</p>",
];

fn write_corpus(path: &Path) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, ",Email Text,Email Type").unwrap();
    let mut row = 0;
    for round in 0..5 {
        for text in PHISHING {
            writeln!(file, "{row},\"{text} case {round}\",Phishing Email").unwrap();
            row += 1;
        }
        for text in SAFE {
            writeln!(file, "{row},\"{text} case {round}\",Safe Email").unwrap();
            row += 1;
        }
    }
    // incomplete rows are dropped
    writeln!(file, "{row},,Safe Email").unwrap();
    writeln!(file, "{},orphan text,", row + 1).unwrap();
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.model.forest.n_trees = 15;
    // every synthetic message shares the "case" suffix
    config.features.lexical.max_df = 1.0;
    config.features.character.max_df = 1.0;
    config
}

fn train_corpus(config: &Config) -> (TrainedModel, phishing_detector::pipeline::evaluate::EvaluationReport) {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("mail.csv");
    write_corpus(&csv);
    let dataset = load_examples(&csv, "Email Text", "Email Type").unwrap();
    assert_eq!(dataset.examples.len(), 60);
    assert_eq!(dataset.dropped, 2);
    train(dataset.examples, config).unwrap()
}

#[test]
fn training_is_deterministic() {
    let config = test_config();
    let (_, first) = train_corpus(&config);
    let (_, second) = train_corpus(&config);

    assert_eq!(first.confusion, second.confusion);
    assert_eq!(first.partitions, second.partitions);
}

#[test]
fn ensemble_training_is_deterministic() {
    let mut config = test_config();
    config.model.kind = ModelKind::Ensemble;
    let (first_model, first) = train_corpus(&config);
    let (second_model, second) = train_corpus(&config);

    assert_eq!(first.confusion, second.confusion);
    assert_eq!(first.partitions, second.partitions);

    let a = Predictor::from_model(first_model);
    let b = Predictor::from_model(second_model);
    for text in PHISHING.iter().chain(SAFE) {
        assert_eq!(a.predict(text), b.predict(text));
    }
}

#[test]
fn smote_equalizes_training_counts_only() {
    let mut config = test_config();
    let (_, balanced) = train_corpus(&config);
    assert_eq!(balanced.partitions.train, [28, 20]);
    assert_eq!(balanced.partitions.train_balanced, [28, 28]);
    assert_eq!(balanced.partitions.synthetic, 8);

    config.balance.enabled = false;
    let (_, plain) = train_corpus(&config);
    assert_eq!(plain.partitions.train_balanced, [28, 20]);
    assert_eq!(plain.partitions.test, balanced.partitions.test);
    assert_eq!(plain.confusion.total(), balanced.confusion.total());
}

#[test]
fn artifact_round_trip_preserves_predictions() {
    let (model, _) = train_corpus(&test_config());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/phishing_model.bin");

    let in_memory = Predictor::from_model(model.clone());
    save_model(&model, &path).unwrap();
    let loaded = Predictor::load(&path).unwrap();

    for text in PHISHING.iter().chain(SAFE).copied().chain(["", "<br/>", "???"]) {
        let a = in_memory.predict(text);
        let b = loaded.predict(text);
        assert_eq!(a, b, "{text}");
        assert!((0.0..=1.0).contains(&a.probability));
    }
    assert_eq!(loaded.model_info(), in_memory.model_info());
}

#[test]
fn predictor_separates_obvious_messages() {
    let (model, _) = train_corpus(&test_config());
    let predictor = Predictor::from_model(model);

    let phishing = predictor.predict(
        "URGENT: your account has been suspended. Verify now at http://secure-login.example.com!!!",
    );
    let safe = predictor.predict("Hi team, the meeting moved to 3pm tomorrow in room B.");
    assert_eq!(phishing.label, Label::Phishing);
    assert_eq!(safe.label, Label::Safe);
    assert!(phishing.probability > safe.probability);

    // repeated calls are identical
    assert_eq!(predictor.predict("Claim your prize"), predictor.predict("Claim your prize"));
}

#[test]
fn gate_follows_threshold() {
    let (model, _) = train_corpus(&test_config());
    let text = "Your password expires today. Click http://reset-password.example.net to keep access";

    let lenient = Predictor::from_model(model.clone()).with_threshold(0.0);
    let strict = Predictor::from_model(model).with_threshold(1.0);

    let prediction = lenient.predict(text);
    assert_eq!(prediction.label, Label::Phishing);
    assert!(lenient.assess(text).decision.is_confident_phishing);
    assert!(!strict.assess(text).decision.is_confident_phishing);

    let safe = lenient.assess("Lunch on Thursday?");
    assert_eq!(
        safe.decision.is_confident_phishing,
        safe.prediction.label == Label::Phishing
    );
}

#[test]
fn predict_command_applies_warning_policy() {
    let (model, _) = train_corpus(&test_config());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    save_model(&model, &path).unwrap();
    let path = path.to_str().unwrap();

    let loud = load_predictor(path, 0.6, true).unwrap();
    assert!(loud.markup_warnings());
    assert_eq!(loud.threshold(), 0.6);

    let quiet = load_predictor(path, 0.73, false).unwrap();
    assert!(!quiet.markup_warnings());
    // the warning policy never changes scores
    let text = "https://secure-login.example.com";
    assert_eq!(loud.predict(text), quiet.predict(text));
}

#[test]
fn ensemble_model_round_trips() {
    let mut config = test_config();
    config.model.kind = ModelKind::Ensemble;
    let (model, report) = train_corpus(&config);
    assert_eq!(report.model, "Ensemble (LR+RF)");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ensemble.bin");
    save_model(&model, &path).unwrap();
    let predictor = Predictor::load(&path).unwrap();
    assert_eq!(predictor.model_info().model_kind, ModelKind::Ensemble);

    let texts: Vec<&str> = PHISHING.iter().chain(SAFE).copied().collect();
    let batch = predictor.predict_batch(&texts);
    let single: Vec<_> = texts.iter().map(|t| predictor.predict(t)).collect();
    assert_eq!(batch, single);
}

#[test]
fn predictor_is_shareable_across_threads() {
    let (model, _) = train_corpus(&test_config());
    let predictor = Arc::new(Predictor::from_model(model));
    let expected = predictor.predict(SAFE[0]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            std::thread::spawn(move || predictor.predict(SAFE[0]))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn missing_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("bad.csv");
    std::fs::write(&csv, "body,kind\nhello,Safe Email\n").unwrap();
    assert!(load_examples(&csv, "Email Text", "Email Type").is_err());
}

#[test]
fn corrupt_artifact_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.bin");
    std::fs::write(&path, [0u8; 16]).unwrap();
    assert!(Predictor::load(&path).is_err());
}
