//! Atlas CLI
//!
//! Command-line client for probe listings and measurement creation.

use clap::Parser;
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atlas_cli::app::{self, log_filter};
use atlas_cli::{Cli, Settings};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = log_filter(cli.verbose);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = app::run(cli, Settings::from_env()) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
