//! Phishing detector CLI binary.

use clap::Parser;
use env_logger::Env;

use phishing_detector::pipeline::cli::{run, CliArgs};
use phishing_detector::Config;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Logging policy comes from the config file, so read it before anything logs
    let loaded = Config::load(&args.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Could not load {}: {}", args.config, e);
        log::warn!("Using default configuration");
        Config::default()
    });

    run(args, config)
}
