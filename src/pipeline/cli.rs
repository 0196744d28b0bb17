//! Command-line interface for the phishing detector.

use clap::{Args, Parser, Subcommand};

use super::config::{Config, ModelKind};
use super::predict::predict_texts;
use super::train::train_model;

/// Phishing message classifier: train a model or classify messages
#[derive(Parser, Debug, Clone)]
#[command(name = "phishing-detector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CliArgs {
    /// Configuration file (defaults are used if it is missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from a labeled CSV file
    Train(TrainArgs),

    /// Classify one or more messages
    Predict(PredictArgs),
}

/// Arguments for training
#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Training CSV path
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output model path
    #[arg(short, long)]
    pub out: Option<String>,

    /// Held-out test fraction
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Train on a seeded random fraction of the data
    #[arg(long)]
    pub sample_frac: Option<f64>,

    /// Disable SMOTE balancing
    #[arg(long)]
    pub no_smote: bool,

    /// Soft-voting ensemble of logistic regression and random forest
    #[arg(long)]
    pub ensemble: bool,

    /// Seed for every randomized step
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the evaluation report as JSON
    #[arg(long)]
    pub report: Option<String>,
}

impl TrainArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.data.csv_path = input.clone();
        }
        if let Some(out) = &self.out {
            config.output.model_path = out.clone();
        }
        if let Some(test_size) = self.test_size {
            config.data.test_size = test_size;
        }
        if let Some(frac) = self.sample_frac {
            config.data.sample_frac = frac;
        }
        if self.no_smote {
            config.balance.enabled = false;
        }
        if self.ensemble {
            config.model.kind = ModelKind::Ensemble;
        }
        if let Some(seed) = self.seed {
            config.data.seed = seed;
        }
        if let Some(report) = &self.report {
            config.output.report_path = Some(report.clone());
        }
    }
}

/// Arguments for prediction
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Message text(s) to classify
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Model path (defaults to the configured output path)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gate threshold (defaults to the configured threshold)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run a parsed command against a loaded configuration.
pub fn run(args: CliArgs, mut config: Config) -> anyhow::Result<()> {
    use anyhow::Context;

    match args.command {
        Command::Train(train) => {
            train.apply(&mut config);
            config.validate().context("invalid training options")?;
            train_model(&config)
                .with_context(|| format!("training from {} failed", config.data.csv_path))
        }
        Command::Predict(predict) => {
            let model = predict
                .model
                .unwrap_or_else(|| config.output.model_path.clone());
            let threshold = predict.threshold.unwrap_or(config.gate.threshold);
            anyhow::ensure!(
                (0.0..=1.0).contains(&threshold),
                "threshold must be in [0, 1], got {threshold}"
            );
            predict_texts(
                &predict.texts,
                &model,
                threshold,
                config.logging.markup_warnings,
                predict.json,
            )
                .with_context(|| format!("could not classify with model {model}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_flags() {
        let args = CliArgs::parse_from([
            "phishing-detector",
            "train",
            "--input",
            "mail.csv",
            "--no-smote",
            "--ensemble",
            "--test-size",
            "0.3",
        ]);
        let Command::Train(train) = args.command else {
            panic!("expected train");
        };
        let mut config = Config::default();
        train.apply(&mut config);

        assert_eq!(config.data.csv_path, "mail.csv");
        assert!(!config.balance.enabled);
        assert_eq!(config.model.kind, ModelKind::Ensemble);
        assert_eq!(config.data.test_size, 0.3);
        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn test_parse_predict() {
        let args = CliArgs::parse_from([
            "phishing-detector",
            "predict",
            "hello",
            "world",
            "--threshold",
            "0.9",
            "--json",
        ]);
        let Command::Predict(predict) = args.command else {
            panic!("expected predict");
        };
        assert_eq!(predict.texts, vec!["hello", "world"]);
        assert_eq!(predict.threshold, Some(0.9));
        assert!(predict.json);
    }

    #[test]
    fn test_predict_requires_text() {
        assert!(CliArgs::try_parse_from(["phishing-detector", "predict"]).is_err());
    }
}
