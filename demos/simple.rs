/// Simple example of using the phishing-detector library
///
/// Train a model first, then run:
/// ```
/// cargo run --release -- train --input data/Phishing_Email.csv
/// cargo run --example simple
/// ```
use phishing_detector::api::Predictor;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Phishing Detector - Simple Example\n");

    let model_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "models/phishing_model.bin".to_string());

    println!("Loading model from {}...", model_path);
    let predictor = Predictor::load(&model_path)?;

    let info = predictor.model_info();
    println!(
        "✓ Model loaded: {} ({} features, test accuracy {:.2}%)\n",
        info.model_kind,
        info.n_features,
        info.test_accuracy * 100.0
    );

    let examples = vec![
        "Dear customer, your account has been suspended. Verify your identity at http://secure-verify.example.com immediately!!!",
        "Hi Sam, attached are the slides for tomorrow's review. Let me know if anything is missing.",
        "<html><body><p>You have WON $5,000! Call +1 (555) 012-3456 to claim.</p></body></html>",
        "",
    ];

    println!("Making predictions...\n");
    println!("{}", "=".repeat(70));

    for text in examples {
        let assessment = predictor.assess(text);

        println!("\nText: \"{}\"", text);
        println!("Prediction: {}", assessment.prediction);
        println!(
            "Confident phishing (> {:.2}): {}",
            predictor.threshold(),
            assessment.decision.is_confident_phishing
        );
    }

    println!("\n{}", "=".repeat(70));
    println!("\n✓ Done!");

    Ok(())
}
