//! Message prediction using a trained model.

use std::time::Instant;

use serde::Serialize;

use crate::api::{Assessment, Predictor};
use crate::error::Result;

#[derive(Serialize)]
struct JsonPrediction<'a> {
    text: &'a str,
    #[serde(flatten)]
    assessment: Assessment,
}

/// Classify each text and print the label, probability and gated decision.
///
/// # Arguments
///
/// * `texts` - Messages to classify
/// * `model_path` - Trained model artifact
/// * `threshold` - Inference gate threshold
/// * `markup_warnings` - Warn on inputs that look like URLs or paths
/// * `json` - Print one JSON array instead of the human-readable report
pub fn predict_texts(
    texts: &[String],
    model_path: &str,
    threshold: f64,
    markup_warnings: bool,
    json: bool,
) -> Result<()> {
    let start = Instant::now();
    let predictor = load_predictor(model_path, threshold, markup_warnings)?;
    let assessments: Vec<Assessment> = texts.iter().map(|t| predictor.assess(t)).collect();

    if json {
        let out: Vec<JsonPrediction> = texts
            .iter()
            .zip(assessments)
            .map(|(text, assessment)| JsonPrediction { text, assessment })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\n===================================================================");
    println!("  Phishing Detector: Prediction");
    println!("===================================================================\n");
    let info = predictor.model_info();
    println!(
        "✓ Model loaded: {} ({} features)\n",
        info.model_kind, info.n_features
    );

    for (text, assessment) in texts.iter().zip(&assessments) {
        println!("Input text:");
        println!("  {}\n", preview(text, 100));
        println!("Prediction: {}", assessment.prediction);
        println!(
            "Decision:   {} (threshold {:.2})\n",
            if assessment.decision.is_confident_phishing {
                "FLAG as phishing"
            } else {
                "allow"
            },
            predictor.threshold()
        );
    }

    println!("Time: {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    println!("===================================================================\n");
    Ok(())
}

/// Load a predictor with the gate threshold and warning policy applied.
pub fn load_predictor(model_path: &str, threshold: f64, markup_warnings: bool) -> Result<Predictor> {
    let predictor = Predictor::load(model_path)?
        .with_threshold(threshold)
        .with_markup_warnings(markup_warnings);
    log::debug!(
        "Predictor ready (threshold {:.2}, markup warnings {})",
        predictor.threshold(),
        predictor.markup_warnings()
    );
    Ok(predictor)
}

/// First `max_chars` characters of `text`, with an ellipsis if truncated.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("ééééé", 2), "éé...");
    }
}
