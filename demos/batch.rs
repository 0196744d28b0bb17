/// Batch prediction example
///
/// Run with:
/// ```
/// cargo run --example batch
/// ```
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use phishing_detector::api::Predictor;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Phishing Detector - Batch Prediction Example\n");

    let predictor = Arc::new(Predictor::load("models/phishing_model.bin")?);
    println!("✓ Model loaded\n");

    let texts = vec![
        "Your mailbox is full. Click here to upgrade storage: http://mail-upgrade.example.net",
        "Meeting moved to 2pm, same room.",
        "Congratulations!!! You were selected for a $1000 gift card. Reply with your bank details.",
        "Can you send me the invoice for last month?",
        "Security alert: unusual sign-in detected. Confirm your password at www.account-check.example",
        "Thanks for lunch yesterday, it was great catching up.",
        "Final notice: your package is on hold. Pay the $2.99 fee at http://parcel-fee.example.org",
        "The quarterly report is attached for your review.",
    ];

    println!("Predicting {} texts in batch...\n", texts.len());

    let start = Instant::now();
    let results = predictor.predict_batch(&texts);
    let elapsed = start.elapsed();

    println!("{}", "=".repeat(90));
    println!("{:<60} | {:^9} | {:>8}", "Text (truncated)", "Label", "Prob %");
    println!("{}", "=".repeat(90));

    for (text, result) in texts.iter().zip(results.iter()) {
        let truncated = match text.char_indices().nth(57) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };

        println!(
            "{:<60} | {:^9} | {:>7.1}%",
            truncated,
            result.label.to_string(),
            result.probability * 100.0
        );
    }

    println!("{}", "=".repeat(90));
    println!("\n✓ Batch prediction complete");
    println!(
        "  Time: {:.2}ms ({:.2}ms per text)",
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / texts.len() as f64
    );

    // The same predictor, shared across threads without locking
    let handles: Vec<_> = texts
        .iter()
        .map(|text| {
            let predictor = Arc::clone(&predictor);
            let text = text.to_string();
            thread::spawn(move || predictor.assess(&text))
        })
        .collect();

    let flagged = handles
        .into_iter()
        .filter_map(|h| h.join().ok())
        .filter(|a| a.decision.is_confident_phishing)
        .count();
    println!("\n✓ {} of {} messages flagged as confident phishing", flagged, texts.len());

    Ok(())
}
