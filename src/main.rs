//! mbti-nlp - Main entry point
//!
//! Personality-type prediction from social-media posts, with a CLI for
//! data inspection, corpus cleaning, and model evaluation.

use clap::Parser;
use mbti_nlp::cli::{run, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mbti_nlp=info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
