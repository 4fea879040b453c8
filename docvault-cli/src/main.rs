//! docvault command line entry point.
//!
//! Parses arguments, initialises logging, and hands off to
//! [`commands::run`]. Errors go to stderr with a non-zero exit.

mod args;
mod commands;

use args::Cli;
use clap::Parser;

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = commands::run(Cli::parse()).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
